//! Pipeline configuration, loaded from a TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddingProvider {
    /// Deterministic local feature hashing; no network, no model weights.
    Hash,
    /// OpenAI-compatible HTTP embeddings endpoint.
    Http,
}

/// Which reranking backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RerankerProvider {
    /// Local token-overlap scoring.
    TokenOverlap,
    /// HTTP cross-encoder rerank endpoint.
    Http,
}

/// Embedding and chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    pub provider: EmbeddingProvider,
    pub model_name: String,
    pub dimension: usize,
    /// Base URL for the HTTP provider.
    pub endpoint: Option<String>,
    /// Maximum chunk size in characters.
    pub max_chars: usize,
    /// Overlap between adjacent chunks in characters.
    pub overlap: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hash,
            model_name: "feature-hash".to_string(),
            dimension: passage_embeddings::DEFAULT_DIMENSION,
            endpoint: None,
            max_chars: 1500,
            overlap: 150,
        }
    }
}

/// Where the index lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseConfig {
    /// Store root directory.
    pub uri: PathBuf,
    /// Table holding the document records.
    pub table_name: String,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            uri: PathBuf::from("knowledge_base"),
            table_name: "documents".to_string(),
        }
    }
}

/// Query-time behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    /// Chunks to return from retrieval after reranking.
    pub n_retrieve: usize,
    /// Section groups to keep after aggregation.
    pub n_sections: usize,
    pub reranker: RerankerProvider,
    pub reranker_model: String,
    /// Base URL for the HTTP reranker.
    pub reranker_endpoint: Option<String>,
    /// Whether to fill neighbor gaps in the top-scoring section.
    pub enrich_first: bool,
    /// How many ranks on each side of a hit to pull in when enriching.
    pub enrich_window: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            n_retrieve: 10,
            n_sections: 5,
            reranker: RerankerProvider::TokenOverlap,
            reranker_model: "token-overlap".to_string(),
            reranker_endpoint: None,
            enrich_first: true,
            enrich_window: 1,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub embeddings: EmbeddingsConfig,
    pub knowledge_base: KnowledgeBaseConfig,
    pub retriever: RetrieverConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            RetrievalError::ConfigRead {
                path: path.to_path_buf(),
                source,
            }
        })?;
        toml::from_str(&content).map_err(|source| RetrievalError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.embeddings.max_chars, 1500);
        assert_eq!(config.embeddings.overlap, 150);
        assert_eq!(config.retriever.n_retrieve, 10);
        assert_eq!(config.retriever.n_sections, 5);
        assert!(config.retriever.enrich_first);
        assert_eq!(config.retriever.enrich_window, 1);
        assert_eq!(config.knowledge_base.table_name, "documents");
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: RagConfig = toml::from_str(
            r#"
            [embeddings]
            provider = "http"
            model_name = "text-embedding-3-small"
            endpoint = "https://api.example.com/v1"

            [retriever]
            n_retrieve = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.embeddings.provider, EmbeddingProvider::Http);
        assert_eq!(config.embeddings.model_name, "text-embedding-3-small");
        // Unspecified fields keep their defaults
        assert_eq!(config.embeddings.dimension, 384);
        assert_eq!(config.retriever.n_retrieve, 20);
        assert_eq!(config.retriever.n_sections, 5);
    }

    #[test]
    fn test_load_missing_file() {
        let err = RagConfig::load("/nonexistent/passage.toml").unwrap_err();
        assert!(matches!(err, RetrievalError::ConfigRead { .. }));
    }
}
