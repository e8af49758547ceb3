//! Turning sections and chunks into indexable records.

use std::fmt::Write as _;

use sha2::{Digest, Sha256};
use tracing::debug;

use passage_store::DocumentRecord;

use crate::chunker::Chunker;
use crate::section::{Section, truncate_chars};

/// Stable 16-hex-character content hash.
pub fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(16);
    for byte in &digest[..8] {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Builds [`DocumentRecord`]s from parsed sections.
///
/// Each section is chunked, and every chunk becomes one record carrying its
/// rank within the section, the section's total chunk count, and stable
/// hashes for both the section and the chunk content. Vectors are left
/// empty; the index writer fills them in at write time.
pub struct DocumentBuilder {
    chunker: Chunker,
}

impl DocumentBuilder {
    /// Create a builder using the given chunker.
    pub fn new(chunker: Chunker) -> Self {
        Self { chunker }
    }

    /// The chunker used for splitting section content.
    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Chunk every section and emit one record per chunk.
    ///
    /// Sections with no usable content produce no records.
    pub fn build(&self, sections: &[Section]) -> Vec<DocumentRecord> {
        let mut records = Vec::new();

        for section in sections {
            let chunks: Vec<String> = self
                .chunker
                .chunk(&section.content)
                .into_iter()
                .filter(|c| !c.trim().is_empty())
                .collect();

            let sibling_count = chunks.len();
            let section_hash = short_hash(&section.name);

            for (rank, chunk) in chunks.into_iter().enumerate() {
                // Rank is part of the identity: repetitive text can produce
                // the same chunk twice within one section
                let content_hash = short_hash(&format!(
                    "{}_{rank}_{}",
                    section.name,
                    truncate_chars(&chunk, 50)
                ));
                records.push(DocumentRecord {
                    text: chunk,
                    section: section.name.clone(),
                    section_num: section.ordinal,
                    kind: section.kind.clone(),
                    section_hash: section_hash.clone(),
                    content_hash,
                    rank_in_section: rank,
                    relative_rank: rank as f32 / sibling_count as f32,
                    sibling_count,
                    vector: Vec::new(),
                });
            }
        }

        debug!(
            sections = sections.len(),
            records = records.len(),
            "Built document records"
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::ChunkerConfig;
    use pretty_assertions::assert_eq;

    fn builder(max_chars: usize, overlap: usize) -> DocumentBuilder {
        DocumentBuilder::new(Chunker::new(ChunkerConfig::new(max_chars, overlap).unwrap()))
    }

    #[test]
    fn test_short_hash_is_stable_and_short() {
        let a = short_hash("Chapter 1");
        let b = short_hash("Chapter 1");
        let c = short_hash("Chapter 2");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_build_ranks_and_counts() {
        let text: String = "abcdefghij".repeat(30);
        let sections = vec![Section::new("Chapter 1", 1, text)];
        let records = builder(100, 10).build(&sections);

        assert!(records.len() > 1);
        let n = records.len();
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.rank_in_section, i);
            assert_eq!(record.sibling_count, n);
            assert_eq!(record.relative_rank, i as f32 / n as f32);
            assert_eq!(record.section, "Chapter 1");
            assert_eq!(record.section_num, 1);
        }
    }

    #[test]
    fn test_build_section_hash_shared_within_section() {
        let text: String = "abcdefghij".repeat(30);
        let sections = vec![
            Section::new("Chapter 1", 1, text.clone()),
            Section::new("Chapter 2", 2, text),
        ];
        let records = builder(100, 10).build(&sections);

        let first: Vec<_> = records.iter().filter(|r| r.section == "Chapter 1").collect();
        let second: Vec<_> = records.iter().filter(|r| r.section == "Chapter 2").collect();

        assert!(first.windows(2).all(|w| w[0].section_hash == w[1].section_hash));
        assert_ne!(first[0].section_hash, second[0].section_hash);
    }

    #[test]
    fn test_build_content_hashes_unique() {
        let text: String = "abcdefghij".repeat(30);
        let sections = vec![Section::new("Chapter 1", 1, text)];
        let records = builder(100, 10).build(&sections);

        let mut hashes: Vec<&str> = records.iter().map(|r| r.content_hash.as_str()).collect();
        hashes.sort_unstable();
        hashes.dedup();
        assert_eq!(hashes.len(), records.len());
    }

    #[test]
    fn test_identical_chunk_text_gets_distinct_hashes() {
        // Periodic text makes the fixed-stride chunker emit the same chunk
        // text at several ranks; their hashes must still differ.
        let text: String = "abcdefghij".repeat(30);
        let sections = vec![Section::new("Chapter 1", 1, text)];
        let records = builder(100, 10).build(&sections);

        assert_eq!(records[0].text, records[1].text);
        assert_ne!(records[0].content_hash, records[1].content_hash);
    }

    #[test]
    fn test_build_skips_empty_sections() {
        let sections = vec![
            Section::new("Empty", 1, ""),
            Section::new("Full", 2, "some real content"),
        ];
        let records = builder(100, 10).build(&sections);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].section, "Full");
    }

    #[test]
    fn test_kind_carried_through() {
        let sections = vec![Section::new("Intro", 0, "front matter text").with_kind("introduction")];
        let records = builder(100, 10).build(&sections);

        assert_eq!(records[0].kind.as_deref(), Some("introduction"));
    }
}
