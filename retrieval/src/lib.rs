//! # Retrieval pipeline
//!
//! Everything between a stored index and a formatted context string, plus
//! the ingestion writer that builds the index in the first place.
//!
//! ```text
//! query ──► Retriever ──► Aggregator ──► Enricher ──► Formatter ──► context
//! ```
//!
//! The [`KnowledgeBase`] facade wires the stages together from a
//! [`RagConfig`]; each stage is also usable on its own.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod format;
pub mod retriever;
pub mod writer;

pub use aggregate::{Aggregator, SectionAggregate};
pub use config::{
    EmbeddingProvider, EmbeddingsConfig, KnowledgeBaseConfig, RagConfig, RerankerProvider,
    RetrieverConfig,
};
pub use engine::{IngestReport, KnowledgeBase, build_embedder, build_reranker};
pub use enrich::Enricher;
pub use error::{Result, RetrievalError};
pub use format::{Formatter, NO_CONTEXT};
pub use retriever::{RetrievedChunk, Retriever};
pub use writer::IndexWriter;
