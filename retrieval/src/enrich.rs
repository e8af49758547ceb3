//! Filling neighbor gaps in a retrieved section.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use passage_store::{Filter, Table};

use crate::aggregate::SectionAggregate;

/// Pulls in chunks adjacent to retrieval hits.
///
/// Retrieval often lands on scattered chunks of a section; reading flows
/// better when the gaps between near-neighbors are filled. For every hit at
/// rank `r`, the ranks within `window` of `r` are wanted; missing ones are
/// fetched from the table and merged in rank order.
pub struct Enricher {
    window: usize,
}

impl Enricher {
    /// Create an enricher with the given neighbor window.
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Fill neighbor gaps in one aggregate.
    ///
    /// A fetch failure is logged and the aggregate returned unchanged;
    /// enrichment is an improvement, never a requirement.
    pub fn enrich(&self, table: &Table, aggregate: SectionAggregate) -> SectionAggregate {
        let present: BTreeSet<usize> = aggregate.ranks.iter().copied().collect();
        let last_rank = aggregate.sibling_count.saturating_sub(1);

        let mut missing: BTreeSet<usize> = BTreeSet::new();
        for &rank in &present {
            let lo = rank.saturating_sub(self.window);
            let hi = rank.saturating_add(self.window).min(last_rank);
            for wanted in lo..=hi {
                if !present.contains(&wanted) {
                    missing.insert(wanted);
                }
            }
        }

        if missing.is_empty() {
            return aggregate;
        }

        let fetched = match table
            .search()
            .filter(Filter::SectionRanks {
                section_hash: aggregate.section_hash.clone(),
                ranks: missing.iter().copied().collect(),
            })
            .run()
        {
            Ok(records) => records,
            Err(err) => {
                warn!(
                    "Enrichment fetch failed for section '{}': {err}",
                    aggregate.section
                );
                return aggregate;
            }
        };

        if fetched.is_empty() {
            return aggregate;
        }

        let mut by_rank: BTreeMap<usize, String> = aggregate
            .ranks
            .iter()
            .copied()
            .zip(aggregate.chunks.iter().cloned())
            .collect();
        for record in fetched {
            by_rank.entry(record.rank_in_section).or_insert(record.text);
        }

        debug!(
            "Enriched section '{}' from {} to {} chunks",
            aggregate.section,
            aggregate.chunks.len(),
            by_rank.len()
        );

        let (ranks, chunks) = by_rank.into_iter().unzip();
        SectionAggregate {
            ranks,
            chunks,
            enriched: true,
            ..aggregate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passage_store::{DocumentRecord, Store};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn record(rank: usize, sibling_count: usize) -> DocumentRecord {
        DocumentRecord {
            text: format!("chunk {rank}"),
            section: "Chapter 1".to_string(),
            section_num: 1,
            kind: None,
            section_hash: "s1".to_string(),
            content_hash: format!("c{rank}"),
            rank_in_section: rank,
            relative_rank: rank as f32 / sibling_count as f32,
            sibling_count,
            vector: Vec::new(),
        }
    }

    fn aggregate(ranks: Vec<usize>, sibling_count: usize) -> SectionAggregate {
        SectionAggregate {
            section: "Chapter 1".to_string(),
            section_num: 1,
            kind: None,
            section_hash: "s1".to_string(),
            sibling_count,
            chunks: ranks.iter().map(|r| format!("chunk {r}")).collect(),
            ranks,
            score_sum: 1.0,
            enriched: false,
        }
    }

    async fn full_table(sibling_count: usize) -> (TempDir, Table) {
        let dir = TempDir::new().unwrap();
        let store = Store::connect(dir.path()).await.unwrap();
        let records = (0..sibling_count).map(|r| record(r, sibling_count)).collect();
        let table = store.create_table("kb", records).await.unwrap();
        (dir, table)
    }

    #[tokio::test]
    async fn test_enrich_fills_gap_between_hits() {
        let (_dir, table) = full_table(6).await;
        let enriched = Enricher::new(1).enrich(&table, aggregate(vec![1, 3], 6));

        assert_eq!(enriched.ranks, vec![0, 1, 2, 3, 4]);
        assert_eq!(enriched.chunks[2], "chunk 2");
        assert!(enriched.enriched);
    }

    #[tokio::test]
    async fn test_enrich_clamps_window_to_section() {
        let (_dir, table) = full_table(3).await;
        let enriched = Enricher::new(2).enrich(&table, aggregate(vec![0], 3));

        // Window reaches below 0 and past the last sibling without panicking
        assert_eq!(enriched.ranks, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_enrich_noop_when_no_gaps() {
        let (_dir, table) = full_table(3).await;
        let enriched = Enricher::new(1).enrich(&table, aggregate(vec![0, 1, 2], 3));

        assert_eq!(enriched.ranks, vec![0, 1, 2]);
        assert!(!enriched.enriched);
    }

    #[tokio::test]
    async fn test_enrich_keeps_existing_chunk_text() {
        let (_dir, table) = full_table(4).await;
        let mut input = aggregate(vec![1], 4);
        input.chunks[0] = "original text".to_string();

        let enriched = Enricher::new(1).enrich(&table, input);
        let pos = enriched.ranks.iter().position(|&r| r == 1).unwrap();
        assert_eq!(enriched.chunks[pos], "original text");
    }
}
