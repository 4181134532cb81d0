//! Error types for the storage layer.

use std::path::PathBuf;

use bluffhall_protocol::ProtocolError;

/// Errors from reading or writing durable records.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] ProtocolError),

    /// The background writer has stopped and no longer accepts work.
    #[error("store writer is closed")]
    WriterClosed,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
