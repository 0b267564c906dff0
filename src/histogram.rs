use std::collections::HashMap;

use crate::log::LogRecord;

/// Per-day record counts, fed incrementally as batches arrive.
///
/// Buckets are keyed by the date portion of each record's `time` and kept in
/// the order their first record arrived.
#[derive(Debug, Default, Clone)]
pub struct DayHistogram {
    buckets: Vec<(String, u64)>,
    index: HashMap<String, usize>,
    total: u64,
}

impl DayHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a full record list
    pub fn from_records(records: &[LogRecord]) -> Self {
        let mut histogram = Self::new();
        histogram.ingest(records);
        histogram
    }

    pub fn ingest(&mut self, records: &[LogRecord]) {
        for record in records {
            self.add(record.day());
        }
    }

    fn add(&mut self, day: &str) {
        self.total += 1;
        match self.index.get(day) {
            Some(&slot) => self.buckets[slot].1 += 1,
            None => {
                self.index.insert(day.to_string(), self.buckets.len());
                self.buckets.push((day.to_string(), 1));
            }
        }
    }

    pub fn buckets(&self) -> &[(String, u64)] {
        &self.buckets
    }

    pub fn count(&self, day: &str) -> u64 {
        self.index.get(day).map_or(0, |&slot| self.buckets[slot].1)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn max_count(&self) -> u64 {
        self.buckets.iter().map(|(_, count)| *count).max().unwrap_or(0)
    }
}
