use super::LogRecord;

/// Default number of records per parser-level batch
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Collects records and hands them to a consumer in bounded batches.
///
/// A batch is delivered as soon as it reaches `batch_size` records, and on
/// an explicit [`flush`](Self::flush). Delivered batches are moved out; the
/// sink never touches them again.
pub struct BatchingSink<F>
where
    F: FnMut(Vec<LogRecord>),
{
    batch: Vec<LogRecord>,
    batch_size: usize,
    deliver: F,
}

impl<F> BatchingSink<F>
where
    F: FnMut(Vec<LogRecord>),
{
    /// Create a sink; a zero batch size is treated as 1
    pub fn new(batch_size: usize, deliver: F) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch: Vec::with_capacity(batch_size),
            batch_size,
            deliver,
        }
    }

    /// Append a record, delivering the batch first thing if it is now full
    pub fn push(&mut self, record: LogRecord) {
        self.batch.push(record);
        if self.batch.len() >= self.batch_size {
            self.flush();
        }
    }

    /// Deliver whatever is buffered. No-op when empty.
    pub fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        let batch = std::mem::replace(&mut self.batch, Vec::with_capacity(self.batch_size));
        (self.deliver)(batch);
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of records waiting for the next delivery
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }
}
