//! Inverted token index over chunk text.
//!
//! A lightweight full-text companion to vector search. The index maps each
//! token to the set of record positions containing it; lookups score records
//! by the number of distinct query tokens they match.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, StoreError};
use crate::record::DocumentRecord;

/// An inverted index from token to record positions.
#[derive(Debug, Default)]
pub struct LexicalIndex {
    postings: HashMap<String, Vec<usize>>,
}

impl LexicalIndex {
    /// Build an index over the given records.
    ///
    /// Fails when there is nothing to index; callers treat this as a
    /// degraded mode, not a fatal condition.
    pub fn build(records: &[DocumentRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(StoreError::LexicalIndex(
                "no documents to index".to_string(),
            ));
        }

        let mut postings: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, record) in records.iter().enumerate() {
            let tokens: HashSet<String> =
                passage_embeddings::tokenize(&record.text).into_iter().collect();
            for token in tokens {
                postings.entry(token).or_default().push(pos);
            }
        }

        if postings.is_empty() {
            return Err(StoreError::LexicalIndex(
                "documents contain no indexable tokens".to_string(),
            ));
        }

        Ok(Self { postings })
    }

    /// Number of distinct tokens in the index.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Check whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Record positions matching the query, ranked by distinct-token hits.
    pub fn lookup(&self, query: &str, limit: usize) -> Vec<usize> {
        let mut hits: HashMap<usize, usize> = HashMap::new();
        for token in passage_embeddings::tokenize(query) {
            if let Some(positions) = self.postings.get(&token) {
                for &pos in positions {
                    *hits.entry(pos).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(usize, usize)> = hits.into_iter().collect();
        // Stable ordering: hit count descending, then record position
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.into_iter().take(limit).map(|(pos, _)| pos).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(text: &str) -> DocumentRecord {
        DocumentRecord {
            text: text.to_string(),
            section: "Chapter 1".to_string(),
            section_num: 1,
            kind: None,
            section_hash: "abc".to_string(),
            content_hash: "def".to_string(),
            rank_in_section: 0,
            relative_rank: 0.0,
            sibling_count: 1,
            vector: vec![],
        }
    }

    #[test]
    fn test_build_empty_fails() {
        let err = LexicalIndex::build(&[]).unwrap_err();
        assert!(matches!(err, StoreError::LexicalIndex(_)));
    }

    #[test]
    fn test_lookup_ranks_by_hits() {
        let records = vec![
            record("the cat sat on the mat"),
            record("the dog chased the cat"),
            record("unrelated text entirely"),
        ];
        let index = LexicalIndex::build(&records).unwrap();

        let hits = index.lookup("cat mat", 10);
        assert_eq!(hits[0], 0);
        assert!(hits.contains(&1));
        assert!(!hits.contains(&2));
    }

    #[test]
    fn test_lookup_limit() {
        let records = vec![record("alpha beta"), record("alpha gamma")];
        let index = LexicalIndex::build(&records).unwrap();
        assert_eq!(index.lookup("alpha", 1).len(), 1);
    }
}
