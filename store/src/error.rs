//! Error types for the document store.

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in the document store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Table does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Vector dimension mismatch between query and stored records.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Lexical index cannot be built.
    #[error("cannot build lexical index: {0}")]
    LexicalIndex(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Similarity computation error.
    #[error("similarity error: {0}")]
    Similarity(#[from] passage_embeddings::EmbeddingError),
}
