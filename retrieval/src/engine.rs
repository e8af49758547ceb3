//! The end-to-end knowledge-base facade.

use std::sync::Arc;

use tracing::info;

use passage_embeddings::{
    Embedder, EmbeddingError, HashingEmbedder, HttpEmbedder, HttpReranker, Reranker,
    TokenOverlapReranker,
};
use passage_ingest::{Chunker, ChunkerConfig, DocumentBuilder, Section, SectionParser};
use passage_store::Store;

use crate::aggregate::Aggregator;
use crate::config::{EmbeddingProvider, RagConfig, RerankerProvider};
use crate::enrich::Enricher;
use crate::error::{Result, RetrievalError};
use crate::format::Formatter;
use crate::retriever::Retriever;
use crate::writer::IndexWriter;

/// What an ingestion run produced.
#[derive(Debug)]
pub struct IngestReport {
    /// Names of the detected sections, in document order.
    pub sections: Vec<String>,
    /// Rows written to the table.
    pub rows: usize,
}

/// Build the embedder named by the configuration.
pub fn build_embedder(config: &RagConfig) -> Result<Arc<dyn Embedder>> {
    let embeddings = &config.embeddings;
    match embeddings.provider {
        EmbeddingProvider::Hash => Ok(Arc::new(HashingEmbedder::new(embeddings.dimension))),
        EmbeddingProvider::Http => {
            let endpoint = embeddings
                .endpoint
                .as_deref()
                .ok_or(EmbeddingError::ProviderNotConfigured)?;
            Ok(Arc::new(HttpEmbedder::new(
                endpoint,
                embeddings.model_name.clone(),
                embeddings.dimension,
            )))
        }
    }
}

/// Build the reranker named by the configuration.
pub fn build_reranker(config: &RagConfig) -> Result<Arc<dyn Reranker>> {
    let retriever = &config.retriever;
    match retriever.reranker {
        RerankerProvider::TokenOverlap => Ok(Arc::new(TokenOverlapReranker::new())),
        RerankerProvider::Http => {
            let endpoint = retriever
                .reranker_endpoint
                .as_deref()
                .ok_or(EmbeddingError::ProviderNotConfigured)?;
            Ok(Arc::new(HttpReranker::new(
                endpoint,
                retriever.reranker_model.clone(),
            )))
        }
    }
}

/// A configured knowledge base: one store, one embedder, one reranker.
///
/// Both pipeline halves hang off this type: [`ingest`](Self::ingest) parses
/// and indexes a document, [`context`](Self::context) answers a query with
/// a formatted context string. Collaborators are injected, so tests and
/// offline setups swap in local providers without touching the pipeline.
pub struct KnowledgeBase {
    config: RagConfig,
    store: Store,
    embedder: Arc<dyn Embedder>,
    reranker: Arc<dyn Reranker>,
}

impl KnowledgeBase {
    /// Open a knowledge base, building providers from the configuration.
    pub async fn open(config: RagConfig) -> Result<Self> {
        let embedder = build_embedder(&config)?;
        let reranker = build_reranker(&config)?;
        Self::with_providers(config, embedder, reranker).await
    }

    /// Open a knowledge base with explicit providers.
    pub async fn with_providers(
        config: RagConfig,
        embedder: Arc<dyn Embedder>,
        reranker: Arc<dyn Reranker>,
    ) -> Result<Self> {
        let store = Store::connect(&config.knowledge_base.uri).await?;
        Ok(Self {
            config,
            store,
            embedder,
            reranker,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Parse a document into sections without writing anything.
    pub fn parse(&self, text: &str, title: &str) -> Vec<Section> {
        SectionParser::new().parse(text, title)
    }

    /// Parse, chunk, embed, and index a document.
    pub async fn ingest(&self, text: &str, title: &str) -> Result<IngestReport> {
        let sections = self.parse(text, title);

        let chunker_config = ChunkerConfig::new(
            self.config.embeddings.max_chars,
            self.config.embeddings.overlap,
        )?;
        let writer = IndexWriter::new(
            DocumentBuilder::new(Chunker::new(chunker_config)),
            Arc::clone(&self.embedder),
        );

        let table_name = &self.config.knowledge_base.table_name;
        let rows = writer.write(&self.store, table_name, &sections).await?;

        info!(
            "Ingested '{title}': {} sections, {rows} rows in table '{table_name}'",
            sections.len()
        );
        Ok(IngestReport {
            sections: sections.into_iter().map(|s| s.name).collect(),
            rows,
        })
    }

    /// Answer a query with a formatted context string.
    ///
    /// Errors carry the pipeline stage they occurred in, so a failed query
    /// in a log names what actually broke.
    pub async fn context(&self, query: &str) -> Result<String> {
        let retriever_config = &self.config.retriever;

        let table = self
            .store
            .open_table(&self.config.knowledge_base.table_name)
            .await
            .map_err(|e| RetrievalError::from(e).at_stage("index", query))?;

        let retriever = Retriever::new(Arc::clone(&self.embedder), Arc::clone(&self.reranker));
        let chunks = retriever
            .retrieve(&table, query, retriever_config.n_retrieve)
            .await
            .map_err(|e| e.at_stage("retrieval", query))?;

        let mut aggregates = Aggregator::group(&chunks, retriever_config.n_sections);

        if retriever_config.enrich_first && !aggregates.is_empty() {
            let first = aggregates.remove(0);
            let enricher = Enricher::new(retriever_config.enrich_window);
            aggregates.insert(0, enricher.enrich(&table, first));
        }

        Ok(Formatter::new(self.config.embeddings.overlap).format(&aggregates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::NO_CONTEXT;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> RagConfig {
        let mut config = RagConfig::default();
        config.knowledge_base.uri = dir.path().to_path_buf();
        config.embeddings.dimension = 32;
        config.embeddings.max_chars = 200;
        config.embeddings.overlap = 20;
        config
    }

    #[tokio::test]
    async fn test_ingest_then_query() {
        let dir = TempDir::new().unwrap();
        let kb = KnowledgeBase::open(test_config(&dir)).await.unwrap();

        let body = "The lighthouse keeper counted the ships as they passed the headland.";
        let text = format!(
            "Chapter 1\n{body}\nChapter 2\nAn uneventful stretch of days followed at the station.\nChapter 3\nSupplies ran low before the relief boat arrived."
        );
        let report = kb.ingest(&text, "Logbook").await.unwrap();
        assert_eq!(report.sections.len(), 3);
        assert!(report.rows >= 3);

        let context = kb.context("lighthouse keeper ships headland").await.unwrap();
        assert!(context.contains("Chapter 1"));
        assert!(context.contains("lighthouse keeper"));
        assert!(context.starts_with("1. "));
    }

    #[tokio::test]
    async fn test_query_before_ingest_names_stage() {
        let dir = TempDir::new().unwrap();
        let kb = KnowledgeBase::open(test_config(&dir)).await.unwrap();

        let err = kb.context("anything").await.unwrap_err();
        match err {
            RetrievalError::QueryFailed { stage, query, .. } => {
                assert_eq!(stage, "index");
                assert_eq!(query, "anything");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_query_with_no_matches_formats_sentinel() {
        let dir = TempDir::new().unwrap();
        let kb = KnowledgeBase::open(test_config(&dir)).await.unwrap();

        kb.ingest("", "Empty").await.unwrap();
        let context = kb.context("anything").await.unwrap();
        assert_eq!(context, NO_CONTEXT);
    }

    #[tokio::test]
    async fn test_http_provider_requires_endpoint() {
        let mut config = RagConfig::default();
        config.embeddings.provider = EmbeddingProvider::Http;
        config.embeddings.endpoint = None;

        assert!(build_embedder(&config).is_err());
    }
}
