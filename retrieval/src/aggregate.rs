//! Grouping retrieved chunks by their source section.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::retriever::RetrievedChunk;

/// All retrieved chunks of one section, in retrieval order.
#[derive(Debug, Clone)]
pub struct SectionAggregate {
    pub section: String,
    pub section_num: u32,
    pub kind: Option<String>,
    pub section_hash: String,
    pub sibling_count: usize,
    /// Chunk texts, parallel to `ranks`.
    pub chunks: Vec<String>,
    /// In-section ranks, parallel to `chunks`.
    pub ranks: Vec<usize>,
    /// Sum of the chunks' reranker scores.
    pub score_sum: f32,
    /// Whether neighbor gaps were filled after retrieval.
    pub enriched: bool,
}

/// Groups retrieved chunks into per-section aggregates.
pub struct Aggregator;

impl Aggregator {
    /// Group chunks by section and keep the `n_sections` best groups.
    ///
    /// Duplicate chunks (same content hash) are dropped, first occurrence
    /// wins. A section's strength is the sum of its chunks' scores, so a
    /// section hit three times beats a section hit once with a slightly
    /// higher single score.
    pub fn group(chunks: &[RetrievedChunk], n_sections: usize) -> Vec<SectionAggregate> {
        let mut seen_hashes: HashSet<&str> = HashSet::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<SectionAggregate> = Vec::new();

        for chunk in chunks {
            if !seen_hashes.insert(&chunk.record.content_hash) {
                continue;
            }

            let pos = *index
                .entry(chunk.record.section_hash.as_str())
                .or_insert_with(|| {
                    groups.push(SectionAggregate {
                        section: chunk.record.section.clone(),
                        section_num: chunk.record.section_num,
                        kind: chunk.record.kind.clone(),
                        section_hash: chunk.record.section_hash.clone(),
                        sibling_count: chunk.record.sibling_count,
                        chunks: Vec::new(),
                        ranks: Vec::new(),
                        score_sum: 0.0,
                        enriched: false,
                    });
                    groups.len() - 1
                });

            let group = &mut groups[pos];
            group.chunks.push(chunk.record.text.clone());
            group.ranks.push(chunk.record.rank_in_section);
            group.score_sum += chunk.relevance_score;
        }

        groups.sort_by(|a, b| {
            b.score_sum
                .partial_cmp(&a.score_sum)
                .unwrap_or(Ordering::Equal)
        });
        groups.truncate(n_sections);

        debug!("Aggregated into {} section groups", groups.len());
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passage_store::DocumentRecord;
    use pretty_assertions::assert_eq;

    fn chunk(
        text: &str,
        section: &str,
        rank: usize,
        score: f32,
    ) -> RetrievedChunk {
        RetrievedChunk {
            record: DocumentRecord {
                text: text.to_string(),
                section: section.to_string(),
                section_num: 1,
                kind: None,
                section_hash: format!("hash-{section}"),
                content_hash: format!("{section}-{rank}"),
                rank_in_section: rank,
                relative_rank: 0.0,
                sibling_count: 10,
                vector: Vec::new(),
            },
            relevance_score: score,
        }
    }

    #[test]
    fn test_group_sums_scores() {
        let chunks = vec![
            chunk("a", "Chapter 1", 0, 0.9),
            chunk("b", "Chapter 2", 0, 0.8),
            chunk("c", "Chapter 1", 1, 0.5),
        ];
        let groups = Aggregator::group(&chunks, 5);

        assert_eq!(groups.len(), 2);
        // 0.9 + 0.5 beats 0.8
        assert_eq!(groups[0].section, "Chapter 1");
        assert!((groups[0].score_sum - 1.4).abs() < 1e-6);
        assert_eq!(groups[0].chunks, vec!["a", "c"]);
        assert_eq!(groups[0].ranks, vec![0, 1]);
    }

    #[test]
    fn test_group_dedups_by_content_hash() {
        let chunks = vec![
            chunk("a", "Chapter 1", 0, 0.9),
            chunk("a again", "Chapter 1", 0, 0.7),
        ];
        let groups = Aggregator::group(&chunks, 5);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].chunks, vec!["a"]);
        assert!((groups[0].score_sum - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_group_truncates_sections() {
        let chunks = vec![
            chunk("a", "Chapter 1", 0, 0.3),
            chunk("b", "Chapter 2", 0, 0.9),
            chunk("c", "Chapter 3", 0, 0.6),
        ];
        let groups = Aggregator::group(&chunks, 2);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].section, "Chapter 2");
        assert_eq!(groups[1].section, "Chapter 3");
    }

    #[test]
    fn test_group_empty_input() {
        assert!(Aggregator::group(&[], 5).is_empty());
    }

    #[test]
    fn test_group_not_yet_enriched() {
        let groups = Aggregator::group(&[chunk("a", "Chapter 1", 0, 0.5)], 5);
        assert!(!groups[0].enriched);
    }
}
