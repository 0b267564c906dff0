use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::time::Duration;

use futures::Stream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::batch::{BatchingSink, DEFAULT_BATCH_SIZE};
use super::reader::{ChunkedStreamReader, DEFAULT_CHUNK_SIZE};
use super::{parse, LogRecord};
use crate::error::FetchError;

/// Byte blocks queued between the blocking reader thread and the async consumer
const BLOCK_QUEUE_DEPTH: usize = 16;

const USER_AGENT: &str = concat!("logscope/", env!("CARGO_PKG_VERSION"));

/// Longest a socket read blocks before the reader checks whether anyone is
/// still listening. Also bounds the wait for response headers.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a log stream comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSource {
    Http(String),
    File(PathBuf),
}

impl LogSource {
    /// `http://` and `https://` are fetched over the network, anything else is a local path
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            LogSource::Http(source.to_string())
        } else if let Some(path) = source.strip_prefix("file://") {
            LogSource::File(PathBuf::from(path))
        } else {
            LogSource::File(PathBuf::from(source))
        }
    }

    fn open(&self, read_timeout: Duration) -> Result<Box<dyn Read + Send>, FetchError> {
        match self {
            LogSource::Http(url) => {
                let agent = ureq::AgentBuilder::new()
                    .user_agent(USER_AGENT)
                    .timeout_read(read_timeout)
                    .build();
                let response = agent
                    .get(url)
                    .call()
                    .map_err(|err| match err {
                        ureq::Error::Status(status, _) => FetchError::Status {
                            url: url.clone(),
                            status,
                        },
                        ureq::Error::Transport(transport) => FetchError::Transport {
                            url: url.clone(),
                            message: transport.to_string(),
                        },
                    })?;
                Ok(Box::new(response.into_reader()))
            }
            LogSource::File(path) => {
                let file = File::open(path).map_err(|source| FetchError::Io {
                    path: path.clone(),
                    source,
                })?;
                Ok(Box::new(file))
            }
        }
    }

    fn read_error(&self, err: std::io::Error) -> FetchError {
        match self {
            LogSource::Http(url) => FetchError::Transport {
                url: url.clone(),
                message: err.to_string(),
            },
            LogSource::File(path) => FetchError::Io {
                path: path.clone(),
                source: err,
            },
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSource::Http(url) => write!(f, "{url}"),
            LogSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Open `source` and expose its body as an async stream of byte blocks.
///
/// The blocking read runs on tokio's blocking pool and feeds a bounded
/// channel, so a slow consumer holds the network read back instead of
/// buffering the body. The stream yields at most one error, after which it
/// ends.
///
/// Dropping the stream stops the reader and closes the connection. A source
/// that has gone quiet is noticed within `read_timeout`, when the blocked
/// read returns and finds the consumer gone.
pub fn byte_stream(
    source: &LogSource,
    block_size: usize,
    read_timeout: Duration,
) -> impl Stream<Item = Result<Vec<u8>, FetchError>> + Send + 'static {
    let (tx, rx) = mpsc::channel(BLOCK_QUEUE_DEPTH);
    let source = source.clone();
    let block_size = block_size.max(1);
    let read_timeout = read_timeout.max(Duration::from_millis(1));

    tokio::task::spawn_blocking(move || match source.open(read_timeout) {
        Ok(reader) => pump(reader, block_size, &tx, |err| source.read_error(err)),
        Err(err) => {
            let _ = tx.blocking_send(Err(err));
        }
    });

    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|block| (block, rx))
    })
}

fn pump<R, E>(
    mut reader: R,
    block_size: usize,
    tx: &mpsc::Sender<Result<Vec<u8>, FetchError>>,
    read_error: E,
) where
    R: Read,
    E: Fn(std::io::Error) -> FetchError,
{
    let mut buffer = vec![0u8; block_size];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                if tx.blocking_send(Ok(buffer[..n].to_vec())).is_err() {
                    // Consumer went away
                    break;
                }
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            // Idle source: keep waiting only while the consumer is still there
            Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                if tx.is_closed() {
                    debug!("consumer gone while source idle, closing");
                    break;
                }
            }
            Err(err) => {
                let _ = tx.blocking_send(Err(read_error(err)));
                break;
            }
        }
    }
}

/// Totals for one completed stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub bytes: u64,
    pub records: u64,
}

/// Reads a source, parses every line and delivers the records in batches.
#[derive(Debug, Clone, Copy)]
pub struct LogFetcher {
    chunk_size: usize,
    batch_size: usize,
    read_timeout: Duration,
}

impl LogFetcher {
    pub fn new(chunk_size: usize, batch_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            batch_size: batch_size.max(1),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Stream `source` to completion, calling `on_logs` with each batch.
    ///
    /// Records parsed before a transport failure are still delivered; the
    /// failure itself is returned once.
    pub async fn fetch<F>(&self, source: &LogSource, on_logs: F) -> Result<FetchSummary, FetchError>
    where
        F: FnMut(Vec<LogRecord>),
    {
        info!(source = %source, chunk_size = self.chunk_size, "starting log stream");

        let mut reader = ChunkedStreamReader::new(self.chunk_size);
        let mut sink = BatchingSink::new(self.batch_size, on_logs);
        let mut records = 0u64;

        let result = reader
            .read_stream(byte_stream(source, self.chunk_size, self.read_timeout), |line| {
                records += 1;
                sink.push(parse(&line));
            })
            .await;
        sink.flush();

        match result {
            Ok(bytes) => {
                debug!(source = %source, bytes, records, "log stream finished");
                Ok(FetchSummary { bytes, records })
            }
            Err(err) => {
                warn!(source = %source, records, error = %err, "log stream failed");
                Err(err)
            }
        }
    }
}

impl Default for LogFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_BATCH_SIZE)
    }
}
