//! Error types for embed-core operations.

use std::path::PathBuf;

/// All errors that can occur in embed-core operations.
///
/// The engine itself never performs IO; these surface from the session store
/// implementations the embedding runtime wires in.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("Session storage unavailable: could not resolve home directory")]
    StorageUnavailable,

    #[error("Session store I/O error: {path}: {source}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session serialization error: {0}")]
    StoreFormat(#[from] serde_json::Error),
}

/// Convenience type alias for Results using EmbedError.
pub type Result<T> = std::result::Result<T, EmbedError>;
