use serde::{Deserialize, Serialize};

/// Default number of entries the log keeps.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// One successful evaluation. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub expression: String,
    pub result: String,
    /// Milliseconds since the Unix epoch, as reported by the host clock.
    pub timestamp_ms: u64,
}

/// Bounded, most-recent-first log of evaluations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepends `entry` and drops whatever falls past the capacity.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: u64) -> HistoryEntry {
        HistoryEntry {
            expression: format!("{n}+0"),
            result: n.to_string(),
            timestamp_ms: n,
        }
    }

    #[test]
    fn record_prepends_and_truncates() {
        let mut log = HistoryLog::new(3);
        for n in 0..5 {
            log.record(entry(n));
        }
        let results: Vec<&str> = log.entries().iter().map(|e| e.result.as_str()).collect();
        assert_eq!(results, vec!["4", "3", "2"]);
        assert_eq!(log.latest().map(|e| e.timestamp_ms), Some(4));
    }

    #[test]
    fn duplicates_are_kept() {
        let mut log = HistoryLog::default();
        log.record(entry(1));
        log.record(entry(1));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn clear_empties_the_log() {
        let mut log = HistoryLog::default();
        log.record(entry(7));
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.capacity(), DEFAULT_HISTORY_CAPACITY);
    }
}
