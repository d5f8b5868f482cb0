//! Fault-injecting engine wrapper
//!
//! Provides a scripted way to make an engine misbehave so retry and
//! error-propagation paths above it can be exercised deterministically.
//!
//! # Fault Types
//!
//! - Conflict: the operation reports a moved watch fence
//! - Io: the operation reports an infrastructure failure
//!
//! Faults are queued per operation and consumed in order; once a queue is
//! empty the call is forwarded to the wrapped engine. A faulted `exec`
//! never reaches the wrapped engine, so nothing from the batch is applied.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use sidx_core::{Error, KvEngine, Result, Watch, WriteBatch};

/// Engine operations a fault can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineOp {
    /// `get`
    Get,
    /// `set`
    Set,
    /// `rpush`
    RPush,
    /// `lrange`
    LRange,
    /// `llen`
    LLen,
    /// `watch`
    Watch,
    /// `exec`
    Exec,
}

impl EngineOp {
    const ALL: [EngineOp; 7] = [
        EngineOp::Get,
        EngineOp::Set,
        EngineOp::RPush,
        EngineOp::LRange,
        EngineOp::LLen,
        EngineOp::Watch,
        EngineOp::Exec,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// A scripted failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Report a watch conflict on the given operation
    Conflict,
    /// Report an infrastructure failure with this message
    Io(String),
}

impl Fault {
    fn into_error(self, key: &str) -> Error {
        match self {
            Fault::Conflict => Error::Conflict {
                key: key.to_string(),
            },
            Fault::Io(msg) => Error::Storage(msg),
        }
    }
}

/// Wraps an engine and injects scripted faults
pub struct FaultyEngine<E> {
    inner: E,
    script: Mutex<FxHashMap<EngineOp, VecDeque<Fault>>>,
    calls: [AtomicUsize; 7],
}

impl<E: KvEngine> FaultyEngine<E> {
    /// Wrap `inner` with an empty fault script
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            script: Mutex::new(FxHashMap::default()),
            calls: Default::default(),
        }
    }

    /// The wrapped engine
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Fail the next call to `op` with `fault`
    pub fn fail_next(&self, op: EngineOp, fault: Fault) {
        self.fail_times(op, fault, 1);
    }

    /// Fail the next `times` calls to `op` with `fault`
    pub fn fail_times(&self, op: EngineOp, fault: Fault, times: usize) {
        let mut script = self.script.lock();
        let queue = script.entry(op).or_default();
        queue.extend(std::iter::repeat(fault).take(times));
    }

    /// Drop every pending fault
    pub fn clear(&self) {
        self.script.lock().clear();
    }

    /// Calls made to `op` so far, faulted or not
    pub fn calls(&self, op: EngineOp) -> usize {
        self.calls[op.index()].load(Ordering::SeqCst)
    }

    /// Calls made across every operation
    pub fn total_calls(&self) -> usize {
        EngineOp::ALL.iter().map(|op| self.calls(*op)).sum()
    }

    fn intercept(&self, op: EngineOp, key: &str) -> Result<()> {
        self.calls[op.index()].fetch_add(1, Ordering::SeqCst);
        let fault = self
            .script
            .lock()
            .get_mut(&op)
            .and_then(|queue| queue.pop_front());
        match fault {
            Some(fault) => Err(fault.into_error(key)),
            None => Ok(()),
        }
    }
}

impl<E: KvEngine> KvEngine for FaultyEngine<E> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.intercept(EngineOp::Get, key)?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.intercept(EngineOp::Set, key)?;
        self.inner.set(key, value)
    }

    fn rpush(&self, key: &str, member: &str) -> Result<u64> {
        self.intercept(EngineOp::RPush, key)?;
        self.inner.rpush(key, member)
    }

    fn lrange(&self, key: &str, start: i64, end: i64) -> Result<Vec<String>> {
        self.intercept(EngineOp::LRange, key)?;
        self.inner.lrange(key, start, end)
    }

    fn llen(&self, key: &str) -> Result<u64> {
        self.intercept(EngineOp::LLen, key)?;
        self.inner.llen(key)
    }

    fn watch(&self, keys: &[String]) -> Result<Watch> {
        let first = keys.first().map(String::as_str).unwrap_or_default();
        self.intercept(EngineOp::Watch, first)?;
        self.inner.watch(keys)
    }

    fn exec(&self, watch: Watch, batch: WriteBatch) -> Result<()> {
        let first = batch.ops().first().map(|op| op.key().to_string());
        self.intercept(EngineOp::Exec, first.as_deref().unwrap_or_default())?;
        self.inner.exec(watch, batch)
    }
}
