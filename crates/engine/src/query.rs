//! Search queries and the paginated response envelope
//!
//! A [`SearchQuery`] names at most one attribute to look up by. It maps
//! onto a [`Lookup`] (the engine key plus whether it is a list) which
//! `IndexedStore::resolve` consumes. [`Page`] is what goes back out.

use serde::{Deserialize, Serialize};
use sidx_core::{Error, Namespace, Record, Result};

use crate::store::Resolved;

/// Incoming search request
///
/// When several fields are set, the first in this order wins:
/// `system_object_id`, `global_id`, `id`, `id_en`, `mode`, `mode_en`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Unique lookup by `global_id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_id: Option<i64>,
    /// Direct lookup by primary key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_object_id: Option<String>,
    /// Unique lookup by `ID`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// List lookup by `Mode`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Unique lookup by `ID_en`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_en: Option<i64>,
    /// List lookup by `Mode_en`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_en: Option<String>,
    /// First list position to return
    #[serde(default)]
    pub offset: i64,
}

/// An engine key plus how to read it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    /// Key passed to `resolve`
    pub key: String,
    /// Whether `key` is a list index
    pub multi_valued: bool,
}

impl Lookup {
    fn unique(key: String) -> Self {
        Self {
            key,
            multi_valued: false,
        }
    }

    fn list(namespace: Namespace, value: &str) -> Self {
        Self {
            key: namespace.key(value),
            multi_valued: true,
        }
    }
}

impl SearchQuery {
    /// Parse a query from its JSON body
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Pick the lookup this query asks for
    pub fn to_lookup(&self) -> Result<Lookup> {
        if let Some(pk) = &self.system_object_id {
            return Ok(Lookup::unique(pk.clone()));
        }
        if let Some(v) = self.global_id {
            return Ok(Lookup::unique(Namespace::GlobalId.key(v)));
        }
        if let Some(v) = self.id {
            return Ok(Lookup::unique(Namespace::Id.key(v)));
        }
        if let Some(v) = self.id_en {
            return Ok(Lookup::unique(Namespace::IdEn.key(v)));
        }
        if let Some(v) = &self.mode {
            return Ok(Lookup::list(Namespace::Mode, v));
        }
        if let Some(v) = &self.mode_en {
            return Ok(Lookup::list(Namespace::ModeEn, v));
        }
        Err(Error::invalid_input("search query names no attribute"))
    }
}

/// Paginated search response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Total matches, independent of the page window
    pub size: u64,
    /// Offset the page starts at
    pub offset: i64,
    /// More matches exist after this page
    #[serde(rename = "hasNext")]
    pub has_next: bool,
    /// Matches exist before this page
    #[serde(rename = "hasPrevious")]
    pub has_previous: bool,
    /// Records in this page
    pub data: Vec<Record>,
}

impl Page {
    /// Wrap a resolve result
    ///
    /// `page_size` is the window `resolve` was asked for. A list window
    /// spans positions `offset..=offset + page_size`, so more matches exist
    /// only past that last position. Entries skipped because their record
    /// is missing do not move the window.
    pub fn from_resolved(
        resolved: Resolved,
        offset: i64,
        page_size: i64,
        multi_valued: bool,
    ) -> Self {
        let (has_next, has_previous) = if multi_valued {
            let next_position = if page_size > 0 {
                offset.saturating_add(page_size).saturating_add(1)
            } else {
                offset
            };
            (
                (next_position.max(0) as u64) < resolved.total,
                offset > 0,
            )
        } else {
            (false, false)
        };
        Self {
            size: resolved.total,
            offset,
            has_next,
            has_previous,
            data: resolved.records,
        }
    }

    /// Serialize for the response body
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
