//! Two-stage retrieval: vector recall, then reranking.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use passage_embeddings::{Embedder, Reranker};
use passage_store::{DocumentRecord, Table};

use crate::error::Result;

/// Hard cap on candidates sent to the reranker.
const MAX_CANDIDATES: usize = 50;

/// One retrieved chunk with its reranker score.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub record: DocumentRecord,
    pub relevance_score: f32,
}

/// Retrieves chunks for a query.
///
/// Vector search over-fetches three times the requested count (capped at
/// [`MAX_CANDIDATES`]) so the reranker has room to reorder, then the top
/// `n` by reranker score are kept.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    reranker: Arc<dyn Reranker>,
}

impl Retriever {
    /// Create a retriever from its two collaborators.
    pub fn new(embedder: Arc<dyn Embedder>, reranker: Arc<dyn Reranker>) -> Self {
        Self { embedder, reranker }
    }

    /// Retrieve the top `n` chunks for `query` from `table`.
    ///
    /// An empty table yields an empty result, not an error.
    pub async fn retrieve(
        &self,
        table: &Table,
        query: &str,
        n: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let query_vector = self.embedder.embed(query).await?;

        let n_candidates = (n * 3).min(MAX_CANDIDATES);
        let candidates = table
            .vector_search(&query_vector)
            .limit(n_candidates)
            .run()?;

        if candidates.is_empty() {
            debug!("No candidates found for query");
            return Ok(Vec::new());
        }

        let passages: Vec<String> = candidates.iter().map(|r| r.text.clone()).collect();
        let scores = self.reranker.score(query, &passages).await?;

        let mut chunks: Vec<RetrievedChunk> = candidates
            .into_iter()
            .zip(scores)
            .map(|(record, relevance_score)| RetrievedChunk {
                record,
                relevance_score,
            })
            .collect();

        chunks.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(Ordering::Equal)
        });
        chunks.truncate(n);

        debug!(
            "Retrieved {} chunks (from {} candidates)",
            chunks.len(),
            n_candidates
        );
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passage_embeddings::{HashingEmbedder, TokenOverlapReranker};
    use passage_store::Store;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    async fn table_with(texts: &[&str]) -> (TempDir, Table) {
        let dir = TempDir::new().unwrap();
        let store = Store::connect(dir.path()).await.unwrap();
        let embedder = HashingEmbedder::new(32);

        let mut records = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            records.push(DocumentRecord {
                text: text.to_string(),
                section: "Chapter 1".to_string(),
                section_num: 1,
                kind: None,
                section_hash: "s1".to_string(),
                content_hash: format!("c{i}"),
                rank_in_section: i,
                relative_rank: i as f32 / texts.len() as f32,
                sibling_count: texts.len(),
                vector: embedder.embed(text).await.unwrap(),
            });
        }

        let table = store.create_table("kb", records).await.unwrap();
        (dir, table)
    }

    fn retriever() -> Retriever {
        Retriever::new(
            Arc::new(HashingEmbedder::new(32)),
            Arc::new(TokenOverlapReranker),
        )
    }

    #[tokio::test]
    async fn test_retrieve_ranks_relevant_chunk_first() {
        let (_dir, table) = table_with(&[
            "the weather was cold and grey that morning",
            "a dragon guarded the mountain pass",
            "breakfast was served at dawn in the hall",
        ])
        .await;

        let chunks = retriever()
            .retrieve(&table, "dragon mountain", 2)
            .await
            .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].record.text, "a dragon guarded the mountain pass");
        assert!(chunks[0].relevance_score > chunks[1].relevance_score);
    }

    #[tokio::test]
    async fn test_retrieve_empty_table() {
        let dir = TempDir::new().unwrap();
        let store = Store::connect(dir.path()).await.unwrap();
        let table = store.create_table("kb", vec![]).await.unwrap();

        let chunks = retriever().retrieve(&table, "anything", 5).await.unwrap();
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_truncates_to_n() {
        let (_dir, table) = table_with(&[
            "alpha text one",
            "alpha text two",
            "alpha text three",
            "alpha text four",
        ])
        .await;

        let chunks = retriever().retrieve(&table, "alpha text", 2).await.unwrap();
        assert_eq!(chunks.len(), 2);
    }

    #[tokio::test]
    async fn test_scores_sorted_descending() {
        let (_dir, table) = table_with(&[
            "nothing relevant here at all",
            "partially relevant query words",
            "the exact query words appear here",
        ])
        .await;

        let chunks = retriever()
            .retrieve(&table, "exact query words", 3)
            .await
            .unwrap();

        for pair in chunks.windows(2) {
            assert!(pair[0].relevance_score >= pair[1].relevance_score);
        }
    }
}
