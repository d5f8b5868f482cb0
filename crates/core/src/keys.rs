//! Key namespaces for derived index entries
//!
//! The primary record lives under its bare primary key. Index entries use
//! `"<namespace>:<value>"`. The prefixes are shared with every other
//! reader of the engine's key space and must not change.
//!
//! | Namespace | Prefix     | Kind   | Source field       |
//! |-----------|------------|--------|--------------------|
//! | GlobalId  | `global_id`| unique | `global_id`        |
//! | Id        | `id`       | unique | `ID`               |
//! | IdEn      | `id_en`    | unique | `ID_en`            |
//! | Mode      | `mode`     | list   | `Mode`             |
//! | ModeEn    | `mode_en`  | list   | `Mode_en`          |

use std::fmt;

use crate::record::Record;

/// An index namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Unique index over `global_id`
    GlobalId,
    /// Unique index over `ID`
    Id,
    /// Unique index over `ID_en`
    IdEn,
    /// List index over `Mode`
    Mode,
    /// List index over `Mode_en`
    ModeEn,
}

impl Namespace {
    /// The three unique namespaces
    pub const UNIQUE: [Namespace; 3] = [Namespace::GlobalId, Namespace::Id, Namespace::IdEn];

    /// The two list namespaces
    pub const LIST: [Namespace; 2] = [Namespace::Mode, Namespace::ModeEn];

    /// Key prefix without the trailing colon
    pub const fn prefix(self) -> &'static str {
        match self {
            Namespace::GlobalId => "global_id",
            Namespace::Id => "id",
            Namespace::IdEn => "id_en",
            Namespace::Mode => "mode",
            Namespace::ModeEn => "mode_en",
        }
    }

    /// Whether entries in this namespace are lists of primary keys
    pub const fn is_multi_valued(self) -> bool {
        matches!(self, Namespace::Mode | Namespace::ModeEn)
    }

    /// Build the index key for `value`
    pub fn key(self, value: impl fmt::Display) -> String {
        format!("{}:{}", self.prefix(), value)
    }

    /// Find the unique namespace a lookup key belongs to, if any
    ///
    /// Anything not carrying a unique prefix is treated as a primary key,
    /// so primary keys may themselves contain colons.
    pub fn classify_unique(lookup: &str) -> Option<Namespace> {
        let (prefix, _) = lookup.split_once(':')?;
        Self::UNIQUE.into_iter().find(|ns| ns.prefix() == prefix)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// The six keys a single record occupies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKeys {
    /// Bare primary key holding the serialized record
    pub primary: String,
    /// `global_id:`, `id:`, `id_en:` entries, in that order
    pub unique: [String; 3],
    /// `mode:`, `mode_en:` entries, in that order
    pub lists: [String; 2],
}

impl RecordKeys {
    /// Derive every key touched when storing `record`
    pub fn for_record(record: &Record) -> Self {
        Self {
            primary: record.system_object_id.clone(),
            unique: [
                Namespace::GlobalId.key(record.global_id),
                Namespace::Id.key(record.id),
                Namespace::IdEn.key(record.id_en),
            ],
            lists: [
                Namespace::Mode.key(&record.mode),
                Namespace::ModeEn.key(&record.mode_en),
            ],
        }
    }

    /// All six keys, primary first; this is the watch set
    pub fn all(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(6);
        keys.push(self.primary.clone());
        keys.extend(self.unique.iter().cloned());
        keys.extend(self.lists.iter().cloned());
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keys_format() {
        let record = Record {
            global_id: 42,
            system_object_id: "777".to_string(),
            id: 1,
            id_en: 9,
            mode: "abc".to_string(),
            mode_en: "cba".to_string(),
            ..Default::default()
        };
        let keys = RecordKeys::for_record(&record);
        assert_eq!(
            keys.all(),
            vec!["777", "global_id:42", "id:1", "id_en:9", "mode:abc", "mode_en:cba"]
        );
    }

    #[test]
    fn test_classify_unique() {
        assert_eq!(Namespace::classify_unique("global_id:42"), Some(Namespace::GlobalId));
        assert_eq!(Namespace::classify_unique("id:1"), Some(Namespace::Id));
        assert_eq!(Namespace::classify_unique("id_en:9"), Some(Namespace::IdEn));
        assert_eq!(Namespace::classify_unique("mode:abc"), None);
        assert_eq!(Namespace::classify_unique("1704691"), None);
        assert_eq!(Namespace::classify_unique("site:12"), None);
    }

    #[test]
    fn test_multi_valued() {
        assert!(Namespace::UNIQUE.iter().all(|ns| !ns.is_multi_valued()));
        assert!(Namespace::LIST.iter().all(|ns| ns.is_multi_valued()));
    }

    #[test]
    fn test_negative_and_unicode_values() {
        assert_eq!(Namespace::Id.key(-3), "id:-3");
        assert_eq!(Namespace::Mode.key("круглосуточно"), "mode:круглосуточно");
    }
}
