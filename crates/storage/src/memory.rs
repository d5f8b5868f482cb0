//! MemoryEngine: in-process engine with optimistic watches
//!
//! This module implements the KvEngine trait using:
//! - `FxHashMap<String, Slot>` for O(1) key lookup
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for monotonically increasing versions
//!
//! # Design Notes
//!
//! - **Per-key versions**: every write stamps the slot with a fresh global
//!   version, so a fence only needs to compare one number per key
//! - **Missing keys fence at 0**: creating a watched key is a conflict
//! - **Validate then apply**: `exec` holds the write lock across fence
//!   validation, type checks and application, so a batch is either fully
//!   visible or not at all

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use sidx_core::{Error, KvEngine, Result, Watch, WriteBatch, WriteOp};
use tracing::trace;

#[derive(Debug, Clone)]
enum SlotValue {
    Bytes(Vec<u8>),
    List(Vec<String>),
}

#[derive(Debug, Clone)]
struct Slot {
    value: SlotValue,
    version: u64,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SlotKind {
    Bytes,
    List,
}

impl Slot {
    fn kind(&self) -> SlotKind {
        match self.value {
            SlotValue::Bytes(_) => SlotKind::Bytes,
            SlotValue::List(_) => SlotKind::List,
        }
    }
}

/// In-memory transactional engine
///
/// Thread-safe through `parking_lot::RwLock` and `AtomicU64`.
/// Reads share the lock; writes and `exec` take it exclusively.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    data: RwLock<FxHashMap<String, Slot>>,
    version: AtomicU64,
}

impl MemoryEngine {
    /// Create a new empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether no key is stored
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Highest version assigned so far
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn write_bytes(&self, data: &mut FxHashMap<String, Slot>, key: &str, value: Vec<u8>) {
        let version = self.next_version();
        data.insert(
            key.to_string(),
            Slot {
                value: SlotValue::Bytes(value),
                version,
            },
        );
    }

    /// Caller must have checked the slot is a list or absent
    fn push_member(&self, data: &mut FxHashMap<String, Slot>, key: &str, member: &str) -> u64 {
        let version = self.next_version();
        let slot = data.entry(key.to_string()).or_insert_with(|| Slot {
            value: SlotValue::List(Vec::new()),
            version,
        });
        slot.version = version;
        match &mut slot.value {
            SlotValue::List(members) => {
                members.push(member.to_string());
                members.len() as u64
            }
            SlotValue::Bytes(_) => unreachable!("push_member on scalar slot"),
        }
    }

    fn check_fences(data: &FxHashMap<String, Slot>, watch: &Watch) -> Result<()> {
        for (key, fenced) in watch.fences() {
            let current = data.get(key).map_or(0, |slot| slot.version);
            if current != *fenced {
                trace!(target: "sidx::storage", key = %key, fenced, current, "fence moved");
                return Err(Error::Conflict { key: key.clone() });
            }
        }
        Ok(())
    }

    /// Reject a batch that would hit a slot of the wrong kind, taking
    /// earlier ops in the same batch into account
    fn check_types(data: &FxHashMap<String, Slot>, batch: &WriteBatch) -> Result<()> {
        let mut staged: FxHashMap<&str, SlotKind> = FxHashMap::default();
        for op in batch.ops() {
            let existing = staged
                .get(op.key())
                .copied()
                .or_else(|| data.get(op.key()).map(Slot::kind));
            match op {
                WriteOp::Set { key, .. } => {
                    if existing == Some(SlotKind::List) {
                        return Err(Error::WrongType { key: key.clone() });
                    }
                    staged.insert(key.as_str(), SlotKind::Bytes);
                }
                WriteOp::RPush { key, .. } => {
                    if existing == Some(SlotKind::Bytes) {
                        return Err(Error::WrongType { key: key.clone() });
                    }
                    staged.insert(key.as_str(), SlotKind::List);
                }
            }
        }
        Ok(())
    }
}

impl KvEngine for MemoryEngine {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.data.read().get(key) {
            None => Ok(None),
            Some(Slot {
                value: SlotValue::Bytes(bytes),
                ..
            }) => Ok(Some(bytes.clone())),
            Some(_) => Err(Error::WrongType {
                key: key.to_string(),
            }),
        }
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut data = self.data.write();
        if data.get(key).map(Slot::kind) == Some(SlotKind::List) {
            return Err(Error::WrongType {
                key: key.to_string(),
            });
        }
        self.write_bytes(&mut data, key, value);
        Ok(())
    }

    fn rpush(&self, key: &str, member: &str) -> Result<u64> {
        let mut data = self.data.write();
        if data.get(key).map(Slot::kind) == Some(SlotKind::Bytes) {
            return Err(Error::WrongType {
                key: key.to_string(),
            });
        }
        Ok(self.push_member(&mut data, key, member))
    }

    fn lrange(&self, key: &str, start: i64, end: i64) -> Result<Vec<String>> {
        let data = self.data.read();
        let members = match data.get(key) {
            None => return Ok(Vec::new()),
            Some(Slot {
                value: SlotValue::List(members),
                ..
            }) => members,
            Some(_) => {
                return Err(Error::WrongType {
                    key: key.to_string(),
                })
            }
        };

        let len = members.len() as i64;
        let start = if start < 0 { (start + len).max(0) } else { start };
        let end = if end < 0 { end + len } else { end.min(len - 1) };
        if start > end || start >= len {
            return Ok(Vec::new());
        }
        Ok(members[start as usize..=end as usize].to_vec())
    }

    fn llen(&self, key: &str) -> Result<u64> {
        match self.data.read().get(key) {
            None => Ok(0),
            Some(Slot {
                value: SlotValue::List(members),
                ..
            }) => Ok(members.len() as u64),
            Some(_) => Err(Error::WrongType {
                key: key.to_string(),
            }),
        }
    }

    fn watch(&self, keys: &[String]) -> Result<Watch> {
        let data = self.data.read();
        let mut seen = FxHashSet::default();
        let fences = keys
            .iter()
            .filter(|key| seen.insert(key.as_str()))
            .map(|key| (key.clone(), data.get(key).map_or(0, |slot| slot.version)))
            .collect();
        Ok(Watch::new(fences))
    }

    fn exec(&self, watch: Watch, batch: WriteBatch) -> Result<()> {
        let mut data = self.data.write();
        Self::check_fences(&data, &watch)?;
        Self::check_types(&data, &batch)?;

        for op in batch.ops() {
            match op {
                WriteOp::Set { key, value } => self.write_bytes(&mut data, key, value.clone()),
                WriteOp::RPush { key, member } => {
                    self.push_member(&mut data, key, member);
                }
            }
        }
        trace!(target: "sidx::storage", ops = batch.len(), "batch applied");
        Ok(())
    }
}
