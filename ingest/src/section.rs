//! Logical sections of a source document.

use serde::{Deserialize, Serialize};

/// A logical, named span of source text: a chapter, part, page, or
/// synthetic paragraph group.
///
/// Sections are created once per parse run and never merged or split
/// afterwards. Ordinal 0 is reserved for front matter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Display name, unique within a parse run.
    pub name: String,

    /// Order within the document; 0 for front matter.
    pub ordinal: u32,

    /// Optional section-type tag (e.g. "introduction", "complete").
    pub kind: Option<String>,

    /// Raw text content of the section.
    pub content: String,
}

impl Section {
    /// Create a new section.
    pub fn new(name: impl Into<String>, ordinal: u32, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ordinal,
            kind: None,
            content: content.into(),
        }
    }

    /// Set the section-type tag.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// Truncate a string to at most `n` characters, respecting char boundaries.
pub(crate) fn truncate_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello world", 5), "hello");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }
}
