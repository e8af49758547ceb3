//! Error types for ingestion.

use thiserror::Error;

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors that can occur during ingestion.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Chunking configuration is unusable.
    #[error("invalid chunking configuration: overlap {overlap} must be smaller than max_chars {max_chars}")]
    InvalidChunking { max_chars: usize, overlap: usize },
}
