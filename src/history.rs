//! Fixed-capacity temperature history.
//!
//! One [`LogEntry`] is appended per sampling tick. Once full, the oldest
//! entry is overwritten. Storage is allocated once at construction and
//! never grows.

use alloc::vec::Vec;

/// Default capacity: about 16 minutes at the 2 s sampling period.
pub const DEFAULT_CAPACITY: usize = 500;

/// One sample of both zones with the setpoints in force at the time.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LogEntry {
    /// Unix seconds, or seconds since boot before the wall clock syncs.
    pub timestamp: u64,
    /// Left zone temperature (°C).
    pub left_temp: f32,
    /// Right zone temperature (°C).
    pub right_temp: f32,
    /// Left setpoint (°C).
    pub left_setpoint: f32,
    /// Right setpoint (°C).
    pub right_setpoint: f32,
}

/// Ring buffer of [`LogEntry`] values, read oldest first.
///
/// # Example
///
/// ```rust
/// use rs_fridge::history::{LogEntry, TemperatureLog};
///
/// let mut log = TemperatureLog::with_capacity(2);
/// for t in 1..=3 {
///     log.append(LogEntry { timestamp: t, ..Default::default() });
/// }
///
/// let stamps: Vec<u64> = log.iter().map(|e| e.timestamp).collect();
/// assert_eq!(stamps, [2, 3]);
/// ```
#[derive(Clone, Debug)]
pub struct TemperatureLog {
    slots: Vec<LogEntry>,
    idx: usize,
    count: usize,
}

impl Default for TemperatureLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl TemperatureLog {
    /// Create a log holding at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize(capacity, LogEntry::default());
        Self {
            slots,
            idx: 0,
            count: 0,
        }
    }

    /// Append an entry, overwriting the oldest once full.
    pub fn append(&mut self, entry: LogEntry) {
        let cap = self.slots.len();
        self.slots[self.idx] = entry;
        self.idx = (self.idx + 1) % cap;
        if self.count < cap {
            self.count += 1;
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether nothing has been logged yet.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Entries oldest to newest. Each call starts from the oldest again.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> + '_ {
        let cap = self.slots.len();
        let start = if self.count < cap { 0 } else { self.idx };
        (0..self.count).map(move |i| &self.slots[(start + i) % cap])
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&LogEntry> {
        if self.count == 0 {
            return None;
        }
        let cap = self.slots.len();
        Some(&self.slots[(self.idx + cap - 1) % cap])
    }

    /// Owned copy of all entries, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.iter().copied().collect()
    }

    /// Drop all entries, keeping the allocation.
    pub fn clear(&mut self) {
        self.idx = 0;
        self.count = 0;
    }
}
