//! Bounded, newest-first scan history.

use scandeck_protocol::defaults::DEFAULT_HISTORY_CAPACITY;
use scandeck_protocol::ScanRecord;
use serde::Serialize;
use std::collections::VecDeque;

/// Newest-first record buffer with a fixed capacity.
///
/// Records are trusted to arrive in emission order, so eviction drops the
/// oldest by insertion rank and never looks at timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanHistory {
    records: VecDeque<ScanRecord>,
    #[serde(skip)]
    capacity: usize,
}

impl Default for ScanHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ScanHistory {
    /// Capacities below 1 are raised to 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend `record`, returning the evicted oldest record when full.
    pub fn push(&mut self, record: ScanRecord) -> Option<ScanRecord> {
        self.records.push_front(record);
        if self.records.len() > self.capacity {
            self.records.pop_back()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently added record.
    pub fn newest(&self) -> Option<&ScanRecord> {
        self.records.front()
    }

    /// Record by recency rank (0 is newest).
    pub fn get(&self, index: usize) -> Option<&ScanRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScanRecord> {
        self.records.iter()
    }

    pub fn to_vec(&self) -> Vec<ScanRecord> {
        self.records.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: usize) -> ScanRecord {
        ScanRecord::new(format!("r{}", n), "CODE128", (1_700_000_000_000u64 + n as u64).to_string())
    }

    #[test]
    fn test_length_is_bounded_for_any_count() {
        for n in 0..=25 {
            let mut history = ScanHistory::default();
            for i in 1..=n {
                history.push(record(i));
                assert_eq!(history.newest(), Some(&record(i)));
            }
            assert_eq!(history.len(), n.min(10), "after {} pushes", n);
        }
    }

    #[test]
    fn test_twelve_records_evict_oldest_two() {
        let mut history = ScanHistory::default();
        let mut evicted = Vec::new();
        for i in 1..=12 {
            evicted.extend(history.push(record(i)));
        }

        let expected: Vec<ScanRecord> = (3..=12).rev().map(record).collect();
        assert_eq!(history.to_vec(), expected);
        assert_eq!(evicted, vec![record(1), record(2)]);
    }

    #[test]
    fn test_eviction_ignores_timestamps() {
        let mut history = ScanHistory::with_capacity(2);
        history.push(ScanRecord::new("late", "QR", "9999999999999"));
        history.push(ScanRecord::new("early", "QR", "1"));
        let evicted = history.push(ScanRecord::new("next", "QR", "2"));

        assert_eq!(evicted.map(|r| r.payload), Some("late".to_string()));
        assert_eq!(history.get(0).map(|r| r.payload.as_str()), Some("next"));
        assert_eq!(history.get(1).map(|r| r.payload.as_str()), Some("early"));
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut history = ScanHistory::with_capacity(0);
        assert_eq!(history.capacity(), 1);
        history.push(record(1));
        history.push(record(2));
        assert_eq!(history.to_vec(), vec![record(2)]);
    }
}
