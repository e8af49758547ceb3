//! Tables and search over stored records.

use ordered_float::OrderedFloat;
use tracing::{debug, info};

use passage_embeddings::cosine_similarity;

use crate::error::{Result, StoreError};
use crate::lexical::LexicalIndex;
use crate::record::DocumentRecord;

/// A named table of document records.
///
/// Tables are in-memory snapshots of the persisted JSON file; the
/// [`Store`](crate::Store) handles loading and writing them.
#[derive(Debug)]
pub struct Table {
    name: String,
    records: Vec<DocumentRecord>,
    lexical: Option<LexicalIndex>,
}

/// Typed filter over stored columns.
///
/// Filters are explicit variants rather than a predicate string, so an
/// unsupported filter is unrepresentable instead of a runtime parse error.
#[derive(Debug, Clone)]
pub enum Filter {
    /// All chunks of one section.
    Section { section_hash: String },

    /// Specific ranks within one section.
    SectionRanks {
        section_hash: String,
        ranks: Vec<usize>,
    },
}

impl Filter {
    fn matches(&self, record: &DocumentRecord) -> bool {
        match self {
            Filter::Section { section_hash } => record.section_hash == *section_hash,
            Filter::SectionRanks {
                section_hash,
                ranks,
            } => record.section_hash == *section_hash && ranks.contains(&record.rank_in_section),
        }
    }
}

impl Table {
    pub(crate) fn new(name: impl Into<String>, records: Vec<DocumentRecord>) -> Self {
        Self {
            name: name.into(),
            records,
            lexical: None,
        }
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of stored rows.
    pub fn count_rows(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    /// Start a scan over the table.
    pub fn search(&self) -> SearchBuilder<'_> {
        SearchBuilder {
            table: self,
            vector: None,
            filter: None,
            limit: None,
        }
    }

    /// Start a nearest-neighbor search with the given query vector.
    pub fn vector_search<'a>(&'a self, vector: &'a [f32]) -> SearchBuilder<'a> {
        SearchBuilder {
            table: self,
            vector: Some(vector),
            filter: None,
            limit: None,
        }
    }

    /// Build the lexical index over the text column.
    ///
    /// Failure leaves the table fully usable for vector search; callers log
    /// and move on.
    pub fn create_lexical_index(&mut self) -> Result<()> {
        let index = LexicalIndex::build(&self.records)?;
        info!(
            "Built lexical index for table '{}': {} tokens",
            self.name,
            index.len()
        );
        self.lexical = Some(index);
        Ok(())
    }

    /// Whether the lexical index is available.
    pub fn has_lexical_index(&self) -> bool {
        self.lexical.is_some()
    }

    /// Lexical lookup over the text column.
    ///
    /// Returns an error when the index was never built (or failed to build).
    pub fn lexical_search(&self, query: &str, limit: usize) -> Result<Vec<DocumentRecord>> {
        let index = self
            .lexical
            .as_ref()
            .ok_or_else(|| StoreError::LexicalIndex("index not built".to_string()))?;

        Ok(index
            .lookup(query, limit)
            .into_iter()
            .map(|pos| self.records[pos].clone())
            .collect())
    }
}

/// Builder for table scans and vector searches.
pub struct SearchBuilder<'a> {
    table: &'a Table,
    vector: Option<&'a [f32]>,
    filter: Option<Filter>,
    limit: Option<usize>,
}

impl SearchBuilder<'_> {
    /// Restrict results to records matching the filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Cap the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Execute the search.
    ///
    /// Vector searches return records ranked by cosine similarity
    /// descending; plain scans keep insertion order.
    pub fn run(self) -> Result<Vec<DocumentRecord>> {
        let mut candidates: Vec<&DocumentRecord> = self
            .table
            .records()
            .iter()
            .filter(|r| self.filter.as_ref().is_none_or(|f| f.matches(r)))
            .collect();

        if let Some(query) = self.vector {
            let mut scored: Vec<(OrderedFloat<f32>, &DocumentRecord)> =
                Vec::with_capacity(candidates.len());
            for record in candidates {
                if record.vector.len() != query.len() {
                    return Err(StoreError::DimensionMismatch {
                        expected: query.len(),
                        actual: record.vector.len(),
                    });
                }
                let score = cosine_similarity(query, &record.vector)?;
                scored.push((OrderedFloat(score), record));
            }

            scored.sort_by(|a, b| b.0.cmp(&a.0));
            candidates = scored.into_iter().map(|(_, r)| r).collect();
        }

        if let Some(limit) = self.limit {
            candidates.truncate(limit);
        }

        debug!(
            "Search over table '{}' returned {} records",
            self.table.name(),
            candidates.len()
        );

        Ok(candidates.into_iter().cloned().collect())
    }
}
