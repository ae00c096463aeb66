//! Item sink trait and errors
//!
//! A sink receives every emitted record exactly once, in emission order.
//! The coordinator owns its sink, so implementations need no interior
//! locking of their own.

use crate::job::JobRecord;
use thiserror::Error;

/// Errors that can occur while writing records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to open output {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for emitted job records
pub trait ItemSink: Send {
    /// Writes one record
    fn push(&mut self, record: &JobRecord) -> SinkResult<()>;

    /// Flushes buffered records
    fn flush(&mut self) -> SinkResult<()>;
}
