//! Cross-encoder rerankers.
//!
//! A reranker rescores `(query, passage)` pairs with a model that is more
//! expensive and more accurate than the initial vector retrieval. Scores are
//! returned in the order of the input passages.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

use crate::error::{EmbeddingError, Result};
use crate::tokenize;

/// Trait for cross-encoder collaborators.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Identifier of the configured model.
    fn model_name(&self) -> &str;

    /// Score each passage against the query.
    ///
    /// The returned vector has the same length and order as `passages`.
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>>;
}

/// Remote reranker over a rerank-style HTTP endpoint.
///
/// Speaks the `{model, query, documents}` request shape used by hosted
/// rerank APIs; results arrive as `(index, relevance_score)` pairs and are
/// mapped back to input order.
pub struct HttpReranker {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl HttpReranker {
    /// Create a new reranker against the given base URL.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: std::env::var("RERANKER_API_KEY").ok(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Set the API key explicitly.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

#[async_trait]
impl Reranker for HttpReranker {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Reranking {} passages with model: {}",
            passages.len(),
            self.model
        );

        let body = serde_json::json!({
            "model": self.model,
            "query": query,
            "documents": passages,
        });

        let mut request = self
            .client
            .post(format!("{}/rerank", self.base_url))
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "API error: {error_text}"
            )));
        }

        let result: RerankResponse = response.json().await?;

        let mut scores = vec![None; passages.len()];
        for item in result.results {
            if item.index >= passages.len() {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "result index {} out of range",
                    item.index
                )));
            }
            scores[item.index] = Some(item.relevance_score);
        }

        scores
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                s.ok_or_else(|| {
                    EmbeddingError::InvalidResponse(format!("missing score for passage {i}"))
                })
            })
            .collect()
    }
}

/// Rerank API response format.
#[derive(Debug, Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Debug, Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}

/// Deterministic local reranker scoring lexical overlap.
///
/// The score is the fraction of distinct query tokens that appear in the
/// passage. A crude relevance model, but stable and fast, which makes it a
/// usable cross-encoder stand-in for offline pipelines and tests.
pub struct TokenOverlapReranker;

impl TokenOverlapReranker {
    /// Create a new token-overlap reranker.
    pub fn new() -> Self {
        Self
    }
}

impl Default for TokenOverlapReranker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reranker for TokenOverlapReranker {
    fn model_name(&self) -> &str {
        "token-overlap"
    }

    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        let query_tokens: HashSet<String> = tokenize(query).into_iter().collect();

        let scores = passages
            .iter()
            .map(|passage| {
                if query_tokens.is_empty() {
                    return 0.0;
                }
                let passage_tokens: HashSet<String> = tokenize(passage).into_iter().collect();
                let hits = query_tokens.intersection(&passage_tokens).count();
                hits as f32 / query_tokens.len() as f32
            })
            .collect();

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_token_overlap_ordering() {
        let reranker = TokenOverlapReranker::new();
        let passages = vec![
            "completely unrelated content".to_string(),
            "the lighthouse keeper counted brass keys".to_string(),
            "a lighthouse by the sea".to_string(),
        ];

        let scores = reranker
            .score("lighthouse keeper brass keys", &passages)
            .await
            .unwrap();

        assert_eq!(scores.len(), 3);
        assert!(scores[1] > scores[2]);
        assert!(scores[2] > scores[0]);
    }

    #[tokio::test]
    async fn test_token_overlap_empty_query() {
        let reranker = TokenOverlapReranker::new();
        let scores = reranker
            .score("", &["some passage".to_string()])
            .await
            .unwrap();
        assert_eq!(scores, vec![0.0]);
    }

    #[tokio::test]
    async fn test_token_overlap_empty_passages() {
        let reranker = TokenOverlapReranker::new();
        let scores = reranker.score("query", &[]).await.unwrap();
        assert!(scores.is_empty());
    }

    #[tokio::test]
    async fn test_http_reranker_maps_indices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rerank"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    { "index": 1, "relevance_score": 0.9 },
                    { "index": 0, "relevance_score": 0.2 },
                ],
            })))
            .mount(&server)
            .await;

        let reranker = HttpReranker::new(server.uri(), "test-reranker");
        let passages = vec!["a".to_string(), "b".to_string()];
        let scores = reranker.score("query", &passages).await.unwrap();

        assert_eq!(scores, vec![0.2, 0.9]);
    }

    #[tokio::test]
    async fn test_http_reranker_missing_score() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rerank"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{ "index": 0, "relevance_score": 0.5 }],
            })))
            .mount(&server)
            .await;

        let reranker = HttpReranker::new(server.uri(), "test-reranker");
        let passages = vec!["a".to_string(), "b".to_string()];
        let err = reranker.score("query", &passages).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
    }
}
