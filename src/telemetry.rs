//! Telemetry sink for selection outcomes.
//!
//! Every finished selection appends one record (family, key, choice, elapsed
//! nanoseconds) and registers a human-readable label for its call site. The
//! sink is diagnostic only: nothing in the decision path reads it back.
//!
//! Records are kept in a bounded in-memory buffer and also emitted as
//! `tracing` events at trace level, so subscribers can stream them without
//! touching the buffer.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::bandit::{CallSiteKey, Family, Implementation};

/// Default record buffer capacity.
pub const DEFAULT_TELEMETRY_CAPACITY: usize = 4096;

/// One observed selection outcome.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TelemetryRecord {
    /// Bandit family that made the choice.
    pub family: Family,
    /// Call site the choice was made for.
    pub key: CallSiteKey,
    /// Implementation that ran.
    pub choice: Implementation,
    /// Observed wall-clock duration in nanoseconds.
    pub elapsed_ns: u64,
}

struct TelemetryInner {
    labels: HashMap<CallSiteKey, String>,
    records: VecDeque<TelemetryRecord>,
}

/// Bounded in-memory sink for selection records and call-site labels.
///
/// When the buffer is full the oldest record is dropped; labels are kept
/// for the lifetime of the sink (there is one per distinct key, not one
/// per record).
pub struct TelemetryLog {
    inner: Mutex<TelemetryInner>,
    capacity: usize,
}

impl TelemetryLog {
    /// Create a sink with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TELEMETRY_CAPACITY)
    }

    /// Create a sink holding at most `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(TelemetryInner {
                labels: HashMap::new(),
                records: VecDeque::with_capacity(capacity.min(DEFAULT_TELEMETRY_CAPACITY)),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Register a human-readable label for `key`.
    ///
    /// `repr_fn` is invoked only the first time the key is seen; repeated
    /// registration for the same key is harmless and does not recompute
    /// the label.
    pub fn register_key(&self, key: CallSiteKey, repr_fn: impl FnOnce() -> String) {
        let mut inner = self.inner.lock();
        if let Entry::Vacant(entry) = inner.labels.entry(key) {
            entry.insert(repr_fn());
        }
    }

    /// Append one selection record.
    pub fn record(
        &self,
        family: Family,
        key: CallSiteKey,
        choice: Implementation,
        elapsed_ns: u64,
    ) {
        tracing::trace!(
            family = %family,
            key = key.0,
            choice = %choice,
            elapsed_ns,
            "selection recorded"
        );
        let mut inner = self.inner.lock();
        if inner.records.len() == self.capacity {
            inner.records.pop_front();
        }
        inner.records.push_back(TelemetryRecord {
            family,
            key,
            choice,
            elapsed_ns,
        });
    }

    /// The label registered for `key`, if any.
    pub fn label(&self, key: CallSiteKey) -> Option<String> {
        self.inner.lock().labels.get(&key).cloned()
    }

    /// Snapshot of the buffered records, oldest first.
    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.inner.lock().records.iter().copied().collect()
    }

    /// Number of buffered records.
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// True when no records are buffered.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    /// Drop all records and labels.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.records.clear();
        inner.labels.clear();
    }
}

impl Default for TelemetryLog {
    fn default() -> Self {
        Self::new()
    }
}
