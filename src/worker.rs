use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::log::fetch::DEFAULT_READ_TIMEOUT;
use crate::log::{LogFetcher, LogRecord, LogSource};

/// Settings for one ingestion session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Window size of the worker's stream reader
    pub chunk_size: usize,
    /// Records per parser-level batch
    pub parse_batch_size: usize,
    /// Records per message sent to the consumer
    pub batch_size: usize,
    /// Period of the residual flush timer
    pub flush_interval: Duration,
    /// How long a quiet source may block a read before shutdown is noticed
    pub read_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8 * 1024,
            parse_batch_size: 1000,
            batch_size: 1000,
            flush_interval: Duration::from_millis(200),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Sent from the consumer to the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    Start { source: LogSource },
    Shutdown,
}

/// Sent from the worker to the consumer, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    Batch(Vec<LogRecord>),
    /// The stream ended normally; `total` records were delivered
    EndOfStream { total: u64 },
    /// The stream failed; records delivered before this remain valid
    Error(String),
}

/// Second batching stage, sized for the consumer boundary.
///
/// Parser batches accumulate here. Reaching `batch_size` with no timer
/// running triggers an immediate flush. Every push leaves a periodic timer
/// running to pick up later arrivals; the first tick that flushes the buffer
/// empty stops it. A flush drains the whole buffer in messages of at most
/// `batch_size` records.
pub struct FlushBuffer {
    buffer: VecDeque<LogRecord>,
    batch_size: usize,
    flush_interval: Duration,
    timer: Option<Interval>,
    outbox: mpsc::UnboundedSender<WorkerMessage>,
    delivered: u64,
}

impl FlushBuffer {
    pub fn new(
        batch_size: usize,
        flush_interval: Duration,
        outbox: mpsc::UnboundedSender<WorkerMessage>,
    ) -> Self {
        Self {
            buffer: VecDeque::new(),
            batch_size: batch_size.max(1),
            flush_interval,
            timer: None,
            outbox,
            delivered: 0,
        }
    }

    /// Take one parser batch
    pub fn push_batch(&mut self, records: Vec<LogRecord>) {
        self.buffer.extend(records);

        if self.buffer.len() >= self.batch_size && self.timer.is_none() {
            self.flush();
        }

        // Catches whatever arrives next; a tick that finds nothing stops it
        self.start_timer();
    }

    /// Send everything buffered, in slices of `batch_size`.
    ///
    /// Runs to completion under `&mut self`, so a flush can never interleave
    /// with another one and message order follows arrival order.
    pub fn flush(&mut self) {
        while !self.buffer.is_empty() {
            let take = self.batch_size.min(self.buffer.len());
            let batch: Vec<LogRecord> = self.buffer.drain(..take).collect();
            debug!(records = batch.len(), "flushing batch to consumer");
            self.delivered += batch.len() as u64;
            if self.outbox.send(WorkerMessage::Batch(batch)).is_err() {
                // Consumer is gone, nothing left to deliver to
                self.buffer.clear();
            }
        }
        self.stop_timer();
    }

    /// Wait for the next timer tick. Never resolves while no timer is running.
    pub async fn tick(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    pub fn timer_active(&self) -> bool {
        self.timer.is_some()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Records handed to the consumer so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    fn send(&self, message: WorkerMessage) {
        let _ = self.outbox.send(message);
    }

    fn start_timer(&mut self) {
        if self.timer.is_none() {
            let mut timer = interval_at(Instant::now() + self.flush_interval, self.flush_interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.timer = Some(timer);
        }
    }

    fn stop_timer(&mut self) {
        self.timer = None;
    }
}

/// Background ingestion session: fetches, parses and re-batches one stream
pub struct IngestionWorker {
    config: WorkerConfig,
    buffer: FlushBuffer,
}

impl IngestionWorker {
    /// Spawn a worker task and return the consumer side of its channels
    pub fn spawn(config: WorkerConfig) -> WorkerHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (message_tx, message_rx) = mpsc::unbounded_channel();

        let worker = IngestionWorker {
            config,
            buffer: FlushBuffer::new(config.batch_size, config.flush_interval, message_tx),
        };
        let task = tokio::spawn(worker.run(command_rx));

        WorkerHandle {
            commands: command_tx,
            messages: message_rx,
            task: Some(task),
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<WorkerCommand>) {
        let source = loop {
            match commands.recv().await {
                Some(WorkerCommand::Start { source }) => break source,
                Some(WorkerCommand::Shutdown) | None => {
                    debug!("worker shut down before start");
                    return;
                }
            }
        };
        info!(source = %source, "ingestion started");

        let (batch_tx, mut batch_rx) = mpsc::unbounded_channel::<Vec<LogRecord>>();
        let fetcher = LogFetcher::new(self.config.chunk_size, self.config.parse_batch_size)
            .with_read_timeout(self.config.read_timeout);
        let fetch_source = source.clone();
        let fetch = tokio::spawn(async move {
            fetcher
                .fetch(&fetch_source, |batch| {
                    let _ = batch_tx.send(batch);
                })
                .await
        });

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(WorkerCommand::Start { source: ignored }) => {
                        warn!(source = %ignored, "ingestion already running, ignoring start");
                    }
                    Some(WorkerCommand::Shutdown) | None => {
                        fetch.abort();
                        while let Ok(batch) = batch_rx.try_recv() {
                            self.buffer.push_batch(batch);
                        }
                        self.buffer.flush();
                        info!(delivered = self.buffer.delivered(), "ingestion shut down");
                        return;
                    }
                },
                batch = batch_rx.recv() => match batch {
                    Some(batch) => self.buffer.push_batch(batch),
                    // Sender dropped: the fetch task is done
                    None => break,
                },
                _ = self.buffer.tick() => self.buffer.flush(),
            }
        }

        let outcome = fetch.await;
        self.buffer.flush();
        let total = self.buffer.delivered();

        match outcome {
            Ok(Ok(summary)) => {
                info!(source = %source, records = total, bytes = summary.bytes, "ingestion finished");
                self.buffer.send(WorkerMessage::EndOfStream { total });
            }
            Ok(Err(err)) => {
                warn!(source = %source, error = %err, "ingestion failed");
                self.buffer.send(WorkerMessage::Error(err.to_string()));
            }
            Err(err) => {
                warn!(source = %source, error = %err, "ingestion task aborted");
                self.buffer
                    .send(WorkerMessage::Error(format!("ingestion task failed: {err}")));
            }
        }
    }
}

/// Consumer side of a running [`IngestionWorker`]
pub struct WorkerHandle {
    commands: mpsc::UnboundedSender<WorkerCommand>,
    messages: mpsc::UnboundedReceiver<WorkerMessage>,
    task: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Begin streaming `source`. Only the first start of a session has an effect.
    pub fn start(&self, source: LogSource) {
        let _ = self.commands.send(WorkerCommand::Start { source });
    }

    /// Next message if one is ready
    pub fn try_recv(&mut self) -> Option<WorkerMessage> {
        self.messages.try_recv().ok()
    }

    /// Wait for the next message; `None` once the worker is gone and drained
    pub async fn recv(&mut self) -> Option<WorkerMessage> {
        self.messages.recv().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Stop the worker after it flushes what it holds.
    ///
    /// Messages flushed during shutdown stay readable through
    /// [`try_recv`](Self::try_recv); nothing arrives after this returns.
    pub async fn shutdown(&mut self) {
        let _ = self.commands.send(WorkerCommand::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "ingestion worker did not stop cleanly");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.commands.send(WorkerCommand::Shutdown);
        }
    }
}
