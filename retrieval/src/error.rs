//! Error types for the retrieval pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors from the query and ingestion pipelines.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// A query failed, tagged with the pipeline stage that broke.
    #[error("query failed during {stage} for \"{query}\": {source}")]
    QueryFailed {
        stage: &'static str,
        query: String,
        #[source]
        source: Box<RetrievalError>,
    },

    #[error(transparent)]
    Embedding(#[from] passage_embeddings::EmbeddingError),

    #[error(transparent)]
    Store(#[from] passage_store::StoreError),

    #[error(transparent)]
    Ingest(#[from] passage_ingest::IngestError),

    #[error("failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl RetrievalError {
    /// Wrap an error with the query stage it occurred in.
    pub(crate) fn at_stage(self, stage: &'static str, query: &str) -> Self {
        RetrievalError::QueryFailed {
            stage,
            query: query.to_string(),
            source: Box::new(self),
        }
    }
}
