//! The stored document schema.

use serde::{Deserialize, Serialize};

use passage_embeddings::Embedding;

/// One stored chunk of a section, as indexed in a table.
///
/// The record is the single schema shared by the ingestion and query paths.
/// `rank_in_section` is the chunk's 0-based position among its section's
/// chunks in creation order; `relative_rank` is that rank divided by
/// `sibling_count`, in `[0, 1)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Chunk text.
    pub text: String,

    /// Display name of the owning section.
    pub section: String,

    /// Ordinal of the owning section within the parse run.
    pub section_num: u32,

    /// Optional section-type tag (e.g. "introduction").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Hash of the section name, used for grouping and filtering.
    pub section_hash: String,

    /// Content-derived hash, used for deduplication.
    pub content_hash: String,

    /// 0-based position among the section's chunks.
    pub rank_in_section: usize,

    /// `rank_in_section / sibling_count`.
    pub relative_rank: f32,

    /// Total number of chunks in the owning section.
    pub sibling_count: usize,

    /// Embedding vector for the chunk text.
    pub vector: Embedding,
}
