//! # Embeddings
//!
//! Embedding and cross-encoder collaborators for the passage retrieval
//! pipeline.
//!
//! The rest of the workspace treats both models as opaque services: an
//! [`Embedder`] turns text into dense vectors, a [`Reranker`] rescores
//! `(query, passage)` pairs with a more accurate relevance model. Both are
//! constructed once at process start and shared behind `Arc`, so there is no
//! hidden global model state and tests can inject deterministic stand-ins.
//!
//! ## Providers
//!
//! - [`HttpEmbedder`] / [`HttpReranker`]: remote inference over HTTP
//!   (OpenAI-compatible `/embeddings`, rerank-style `/rerank`).
//! - [`HashingEmbedder`] / [`TokenOverlapReranker`]: deterministic local
//!   implementations for offline use and tests.

pub mod error;
pub mod provider;
pub mod reranker;
pub mod similarity;

pub use error::{EmbeddingError, Result};
pub use provider::{Embedder, HashingEmbedder, HttpEmbedder};
pub use reranker::{HttpReranker, Reranker, TokenOverlapReranker};
pub use similarity::{cosine_similarity, normalize};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Default embedding dimension (MiniLM-class sentence encoders).
pub const DEFAULT_DIMENSION: usize = 384;

/// Split text into lowercase alphanumeric tokens.
///
/// Shared by the hashing embedder and the token-overlap reranker so both
/// sides of the offline pipeline agree on what a token is.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}
