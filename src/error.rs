use std::path::PathBuf;

use thiserror::Error;

/// Terminal failure of one log stream.
///
/// Raised at most once per fetch. Records delivered before it stay valid.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to '{url}' failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("request to '{url}' failed: {message}")]
    Transport { url: String, message: String },

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// HTTP status code, when the failure was a non-success response
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
