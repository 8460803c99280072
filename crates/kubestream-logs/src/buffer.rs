use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

use kubestream_types::{LogLevel, LogRecord};

/// Default number of records kept before the oldest are evicted
pub const DEFAULT_CAPACITY: usize = 5_000;

struct Ring {
    records: VecDeque<LogRecord>,
    /// Records evicted from the head since the last clear
    evicted: u64,
}

/// Bounded FIFO ring of log records, in arrival order
///
/// Clones share the same storage, so the renderer and exporter can hold a
/// handle without copying records.
#[derive(Clone)]
pub struct LogBuffer {
    ring: Arc<RwLock<Ring>>,
    capacity: usize,
}

impl LogBuffer {
    /// Create a new log buffer with the given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Arc::new(RwLock::new(Ring {
                records: VecDeque::with_capacity(capacity),
                evicted: 0,
            })),
            capacity,
        }
    }

    /// Append at the tail, returning the record evicted from the head, if any
    pub fn push(&self, record: LogRecord) -> Option<LogRecord> {
        let mut ring = self.ring.write();
        let evicted = if ring.records.len() >= self.capacity {
            ring.evicted += 1;
            ring.records.pop_front()
        } else {
            None
        };
        ring.records.push_back(record);
        evicted
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.ring.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.read().records.is_empty()
    }

    /// Total records evicted since the last clear
    pub fn evicted(&self) -> u64 {
        self.ring.read().evicted
    }

    /// Get all records (cloned for rendering and export)
    pub fn all(&self) -> Vec<LogRecord> {
        self.ring.read().records.iter().cloned().collect()
    }

    /// Get records in a range (for virtual scrolling)
    pub fn range(&self, start: usize, count: usize) -> Vec<LogRecord> {
        let ring = self.ring.read();
        ring.records.iter().skip(start).take(count).cloned().collect()
    }

    /// Run `f` over the records without cloning them
    pub fn with_records<R>(&self, f: impl FnOnce(&VecDeque<LogRecord>, u64) -> R) -> R {
        let ring = self.ring.read();
        f(&ring.records, ring.evicted)
    }

    /// Count per level, recomputed from the current contents
    pub fn level_counts(&self) -> LevelCounts {
        let ring = self.ring.read();
        let mut counts = LevelCounts::default();

        for record in ring.records.iter() {
            match record.level {
                LogLevel::Error => counts.error += 1,
                LogLevel::Warning => counts.warning += 1,
                LogLevel::Info => counts.info += 1,
                LogLevel::Debug => counts.debug += 1,
                LogLevel::Trace => counts.trace += 1,
            }
        }

        counts
    }

    /// Clear all records and the eviction count
    pub fn clear(&self) {
        let mut ring = self.ring.write();
        ring.records.clear();
        ring.evicted = 0;
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Counts per log level
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub debug: usize,
    pub trace: usize,
}

impl LevelCounts {
    pub fn total(&self) -> usize {
        self.error + self.warning + self.info + self.debug + self.trace
    }

    pub fn get(&self, level: LogLevel) -> usize {
        match level {
            LogLevel::Error => self.error,
            LogLevel::Warning => self.warning,
            LogLevel::Info => self.info,
            LogLevel::Debug => self.debug,
            LogLevel::Trace => self.trace,
        }
    }
}
