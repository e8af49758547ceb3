//! Embedding providers.
//!
//! Two implementations of the [`Embedder`] collaborator: a remote HTTP
//! provider speaking the OpenAI-compatible `/embeddings` protocol, and a
//! deterministic feature-hashing encoder for offline use.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{EmbeddingError, Result};
use crate::similarity::normalize;
use crate::{Embedding, tokenize};

/// Trait for embedding collaborators.
///
/// Re-encoding identical text must yield identical vectors for a given
/// configured model; the ingestion pipeline relies on this for idempotent
/// rebuilds.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the configured model.
    fn model_name(&self) -> &str;

    /// Output dimensionality.
    fn dimension(&self) -> usize;

    /// Generate an embedding for one text.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        // Default implementation: process sequentially
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }
}

/// Remote embedding provider over an OpenAI-compatible `/embeddings`
/// endpoint. Works against hosted APIs as well as local inference servers;
/// the bearer key is optional for the latter.
pub struct HttpEmbedder {
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
    client: reqwest::Client,
}

impl HttpEmbedder {
    /// Create a new provider against the given base URL.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: std::env::var("EMBEDDINGS_API_KEY").ok(),
            model: model.into(),
            dimension,
            client: reqwest::Client::new(),
        }
    }

    /// Set the API key explicitly.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    async fn request(&self, input: serde_json::Value) -> Result<Vec<Embedding>> {
        let body = serde_json::json!({
            "input": input,
            "model": self.model,
        });

        let mut request = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "API error: {error_text}"
            )));
        }

        let result: EmbeddingsResponse = response.json().await?;

        let mut vectors: Vec<Embedding> = Vec::with_capacity(result.data.len());
        for item in result.data {
            if item.embedding.len() != self.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: item.embedding.len(),
                });
            }
            vectors.push(item.embedding);
        }

        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        debug!("Generating embedding with model: {}", self.model);

        let vectors = self.request(serde_json::json!(text)).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding in response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Generating batch embeddings for {} texts with model: {}",
            texts.len(),
            self.model
        );

        let vectors = self.request(serde_json::json!(texts)).await?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        info!("Generated {} batch embeddings", vectors.len());
        Ok(vectors)
    }
}

/// OpenAI-compatible API response format.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Deterministic local embedder using signed feature hashing.
///
/// Each token is FNV-1a hashed into one of `dimension` buckets with a sign
/// bit, and the resulting vector is normalized to unit length. Not a
/// substitute for a trained encoder, but stable across processes, which is
/// what the determinism guarantees and the offline test suite need.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create a new hashing embedder with the given output dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(crate::DEFAULT_DIMENSION)
    }
}

/// FNV-1a, 64-bit. Fixed seed so vectors are stable across processes.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        "feature-hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        normalize(&mut vector);
        Ok(vector)
    }
}
