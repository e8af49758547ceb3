//! The section-parsing cascade.

use regex_lite::Regex;
use tracing::{debug, warn};

use crate::section::Section;
use crate::strategy::{
    ChapterOnly, NumberedSections, PageMarkers, ParagraphGroups, PartChapter, PlayActScene,
    SectionStrategy, StudyGuide, WeeklyGuide,
};

/// Splits raw document text into logical sections.
///
/// Detection strategies are tried in order from most to least specific;
/// the first one that matches wins. When nothing matches, the whole
/// document becomes a single section, so parsing never fails and never
/// returns an empty result.
pub struct SectionParser {
    strategies: Vec<Box<dyn SectionStrategy>>,
}

impl Default for SectionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionParser {
    /// Create a parser with the full default cascade.
    pub fn new() -> Self {
        Self::with_strategies(vec![
            Box::new(StudyGuide),
            Box::new(PlayActScene),
            Box::new(WeeklyGuide),
            Box::new(PartChapter),
            Box::new(ChapterOnly),
            Box::new(PageMarkers),
            Box::new(NumberedSections),
            Box::new(ParagraphGroups),
        ])
    }

    /// Create a parser with a custom strategy cascade.
    pub fn with_strategies(strategies: Vec<Box<dyn SectionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Parse text into sections.
    ///
    /// `fallback_name` labels the single whole-document section used when
    /// no strategy matches (typically the document title).
    pub fn parse(&self, text: &str, fallback_name: &str) -> Vec<Section> {
        let cleaned = clean_reader_artifacts(text);

        if cleaned.trim().is_empty() {
            warn!("Parsing empty document");
            return vec![Section::new(fallback_name, 1, "").with_kind("complete")];
        }

        for strategy in &self.strategies {
            if let Some(sections) = strategy.detect(&cleaned) {
                debug!(
                    strategy = strategy.name(),
                    sections = sections.len(),
                    "Section strategy matched"
                );
                return sections;
            }
        }

        debug!("No section strategy matched, using whole document");
        vec![Section::new(fallback_name, 1, cleaned.trim()).with_kind("complete")]
    }
}

/// Strip e-reader and scan artifacts before detection: progress footers,
/// page-title banners, separator rows, and study-guide headers.
fn clean_reader_artifacts(text: &str) -> String {
    let passes = [
        (r"(?i)\d+\s+minutes?\s+left\s+in\s+chapter\s*\d*%?", ""),
        (r"PAGE \d+ - [^\n]+\n={10,}\n", "\n"),
        (r"={10,}\n", "\n"),
        (r"STUDY GUIDE:[^\n]+\n", "\n"),
    ];

    let mut cleaned = text.to_string();
    for (pattern, replacement) in passes {
        if let Ok(re) = Regex::new(pattern) {
            cleaned = re.replace_all(&cleaned, replacement).into_owned();
        }
    }
    cleaned
}
