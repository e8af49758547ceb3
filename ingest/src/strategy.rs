//! Section-detection strategies.
//!
//! Each strategy knows how to recognize one family of document layout:
//! study guides, plays, part/chapter novels, page dumps, numbered notes,
//! and finally plain paragraph runs. A strategy returns `None` when the
//! layout does not match well enough, and the parser falls through to the
//! next one in the cascade.

use regex_lite::{Captures, Regex};
use tracing::debug;

use crate::section::{Section, truncate_chars};

/// Front matter shorter than this (or starting earlier) is not worth its
/// own section.
const INTRO_MIN_OFFSET: usize = 100;
const INTRO_MIN_LEN: usize = 50;

/// Character budget for synthetic paragraph-group sections.
const PARAGRAPH_GROUP_BUDGET: usize = 2000;
const PARAGRAPH_MIN_LEN: usize = 50;

/// A section-detection strategy.
///
/// `detect` returns the parsed sections when the strategy's pattern matches
/// often enough to be trusted, `None` otherwise.
pub trait SectionStrategy: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Try to split the text into sections.
    fn detect(&self, text: &str) -> Option<Vec<Section>>;
}

/// A matched section marker within the text.
struct Marker {
    start: usize,
    end: usize,
    name: String,
    ordinal: Option<u32>,
}

/// Collect markers for every match of `re`, naming each via `name_fn`.
fn collect_markers(
    re: &Regex,
    text: &str,
    name_fn: impl Fn(&Captures) -> (String, Option<u32>),
) -> Vec<Marker> {
    re.captures_iter(text)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            let (name, ordinal) = name_fn(&caps);
            Some(Marker {
                start: m.start(),
                end: m.end(),
                name,
                ordinal,
            })
        })
        .collect()
}

/// Build sections from a marker list: each span runs from a marker's end to
/// the next marker's start. Spans at or under `min_len` are dropped. Front
/// matter becomes an ordinal-0 introduction when it is long enough.
fn sections_from_markers(
    text: &str,
    markers: &[Marker],
    intro_name: &str,
    min_len: usize,
) -> Vec<Section> {
    let mut sections = Vec::new();

    if let Some(first) = markers.first() {
        if first.start > INTRO_MIN_OFFSET {
            let intro = text[..first.start].trim();
            if intro.len() > INTRO_MIN_LEN {
                sections
                    .push(Section::new(intro_name, 0, intro).with_kind("introduction"));
            }
        }
    }

    for (i, marker) in markers.iter().enumerate() {
        let end = markers
            .get(i + 1)
            .map_or(text.len(), |next| next.start);
        let content = text[marker.end..end].trim();
        if !content.is_empty() && content.len() > min_len {
            let ordinal = marker.ordinal.unwrap_or(i as u32 + 1);
            sections.push(Section::new(marker.name.clone(), ordinal, content));
        }
    }

    sections
}

fn non_empty(sections: Vec<Section>) -> Option<Vec<Section>> {
    if sections.is_empty() {
        None
    } else {
        Some(sections)
    }
}

/// "Part N, Chapter M Summary" study-guide layout.
pub struct StudyGuide;

impl SectionStrategy for StudyGuide {
    fn name(&self) -> &'static str {
        "study-guide"
    }

    fn detect(&self, text: &str) -> Option<Vec<Section>> {
        let re = Regex::new(
            r"(?i)(Part\s+\d+,\s*(?:Prologue|Chapters?\s+[\d\-]+))\s*(Summary|Analysis)?",
        )
        .ok()?;

        let markers = collect_markers(&re, text, |caps| {
            let mut name = caps
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            if let Some(suffix) = caps.get(2) {
                name.push(' ');
                name.push_str(suffix.as_str());
            }
            (name, None)
        });

        if markers.len() < 5 {
            return None;
        }
        debug!("Detected study guide format: {} sections", markers.len());
        non_empty(sections_from_markers(text, &markers, "Overview", 30))
    }
}

/// "Act N, Scene M" / "Act N, Prologue" play layout.
pub struct PlayActScene;

impl SectionStrategy for PlayActScene {
    fn name(&self) -> &'static str {
        "play-act-scene"
    }

    fn detect(&self, text: &str) -> Option<Vec<Section>> {
        let re =
            Regex::new(r"(?i)Act\s+([IVX]+|\d+)[,:\s]+(Scene|Prologue)[ \t\-]*([IVX]+|\d+)?").ok()?;

        let markers = collect_markers(&re, text, |caps| {
            let act = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let scene_type = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let scene_num = caps.get(3).map(|m| m.as_str()).unwrap_or_default();

            let name = if scene_num.is_empty() {
                format!("Act {act}, {scene_type}")
            } else {
                format!("Act {act}, {scene_type} {scene_num}")
            };
            (name, None)
        });

        if markers.len() < 5 {
            return None;
        }
        debug!("Detected play structure: {} scenes", markers.len());
        non_empty(sections_from_markers(
            text,
            &markers,
            "Introduction & Context",
            50,
        ))
    }
}

/// "WEEK N: Title" weekly study-guide layout. Sections are renamed to
/// "Chapter N: Title" for better querying.
pub struct WeeklyGuide;

impl SectionStrategy for WeeklyGuide {
    fn name(&self) -> &'static str {
        "weekly-guide"
    }

    fn detect(&self, text: &str) -> Option<Vec<Section>> {
        let re = Regex::new(
            r"(?i)WEEK\s+(\d+|ONE|TWO|THREE|FOUR|FIVE|SIX|SEVEN|EIGHT|NINE|TEN)[: \t]+([^\n]+)",
        )
        .ok()?;

        let markers = collect_markers(&re, text, |caps| {
            let num = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let title = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
            (
                format!("Chapter {num}: {}", truncate_chars(title, 50)),
                None,
            )
        });

        if markers.len() < 3 {
            return None;
        }
        debug!("Detected weekly study guide: {} weeks", markers.len());
        non_empty(sections_from_markers(text, &markers, "Introduction", 50))
    }
}

const CHAPTER_PATTERN: &str = r"(?i)(?:^|\n)\s*(?:Chapter|Ch\.?)\s+(\d+|[IVXLC]+|One|Two|Three|Four|Five|Six|Seven|Eight|Nine|Ten|Eleven|Twelve)[ \t:.\-]*([^\n]*)";

/// Hierarchical Part+Chapter novel layout.
///
/// Part and chapter markers are merged into one position-sorted stream; a
/// part marker opens a running part label prefixed onto subsequent chapter
/// names. A part's own inter-marker span only becomes a section when it is
/// substantial, which avoids degenerate near-empty "Part" sections.
pub struct PartChapter;

struct RawMarker {
    start: usize,
    end: usize,
    is_part: bool,
    id: String,
    title: String,
}

impl SectionStrategy for PartChapter {
    fn name(&self) -> &'static str {
        "part-chapter"
    }

    fn detect(&self, text: &str) -> Option<Vec<Section>> {
        let part_re = Regex::new(
            r"(?i)(?:^|\n)\s*(?:Part|Book|Volume)\s+(\d+|[IVXLC]+|One|Two|Three|Four|First|Second|Third|Fourth)[ \t:.\-]*([^\n]*)",
        )
        .ok()?;
        let chapter_re = Regex::new(CHAPTER_PATTERN).ok()?;

        let mut markers: Vec<RawMarker> = Vec::new();
        let mut n_parts = 0;
        let mut n_chapters = 0;

        for (re, is_part) in [(&part_re, true), (&chapter_re, false)] {
            for caps in re.captures_iter(text) {
                let Some(m) = caps.get(0) else { continue };
                markers.push(RawMarker {
                    start: m.start(),
                    end: m.end(),
                    is_part,
                    id: caps
                        .get(1)
                        .map(|g| g.as_str().to_string())
                        .unwrap_or_default(),
                    title: caps
                        .get(2)
                        .map(|g| g.as_str().trim().to_string())
                        .unwrap_or_default(),
                });
                if is_part {
                    n_parts += 1;
                } else {
                    n_chapters += 1;
                }
            }
        }

        if n_parts < 2 || n_chapters < 3 {
            return None;
        }
        debug!("Detected hierarchical structure: {n_parts} parts, {n_chapters} chapters");

        markers.sort_by_key(|m| m.start);

        let mut sections = Vec::new();
        let mut current_part: Option<String> = None;
        let mut current_part_num: u32 = 0;
        let mut section_num: u32 = 0;

        if let Some(first) = markers.first() {
            if first.start > INTRO_MIN_OFFSET {
                let intro = text[..first.start].trim();
                if !intro.is_empty() {
                    sections
                        .push(Section::new("Introduction", 0, intro).with_kind("introduction"));
                }
            }
        }

        for (i, marker) in markers.iter().enumerate() {
            let end = markers.get(i + 1).map_or(text.len(), |next| next.start);
            let content = text[marker.end..end].trim();

            if marker.is_part {
                let mut part_name = format!("Part {}", marker.id);
                if !marker.title.is_empty() {
                    part_name.push_str(": ");
                    part_name.push_str(truncate_chars(&marker.title, 40));
                }
                current_part_num += 1;

                // A part heading only becomes its own section when there is
                // real text before the next marker
                if content.len() > 200 {
                    section_num += 1;
                    sections.push(Section::new(part_name.clone(), section_num, content));
                }
                current_part = Some(part_name);
            } else {
                section_num += 1;
                let mut chapter_name = format!("Chapter {}", marker.id);
                if !marker.title.is_empty() {
                    chapter_name.push_str(": ");
                    chapter_name.push_str(truncate_chars(&marker.title, 40));
                }

                let full_name = if current_part.is_some() {
                    format!("Part {current_part_num}, {chapter_name}")
                } else {
                    chapter_name
                };

                if !content.is_empty() {
                    sections.push(Section::new(full_name, section_num, content));
                }
            }
        }

        non_empty(sections)
    }
}

/// Chapter-only layout (digits, roman numerals, or spelled-out numbers).
pub struct ChapterOnly;

impl SectionStrategy for ChapterOnly {
    fn name(&self) -> &'static str {
        "chapter-only"
    }

    fn detect(&self, text: &str) -> Option<Vec<Section>> {
        let re = Regex::new(CHAPTER_PATTERN).ok()?;

        let markers = collect_markers(&re, text, |caps| {
            let id = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let title = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();

            let mut name = format!("Chapter {id}");
            if !title.is_empty() {
                name.push_str(": ");
                name.push_str(truncate_chars(title, 50));
            }
            (name, None)
        });

        if markers.len() < 3 {
            return None;
        }
        debug!("Detected chapter structure: {} chapters", markers.len());
        non_empty(sections_from_markers(text, &markers, "Introduction", 0))
    }
}

/// "PAGE N" markers with `=` separator rows, common in PDF extracts.
pub struct PageMarkers;

impl SectionStrategy for PageMarkers {
    fn name(&self) -> &'static str {
        "page-markers"
    }

    fn detect(&self, text: &str) -> Option<Vec<Section>> {
        let re = Regex::new(r"(?i)(?:={10,}\n)?PAGE\s+(\d+)\n(?:={10,}\n)?").ok()?;
        let separator_re = Regex::new(r"={10,}").ok()?;

        let markers = collect_markers(&re, text, |caps| {
            let num = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            (format!("Page {num}"), num.parse().ok())
        });

        if markers.len() < 3 {
            return None;
        }
        debug!("Detected page markers: {} pages", markers.len());

        let mut sections = Vec::new();
        for (i, marker) in markers.iter().enumerate() {
            let end = markers.get(i + 1).map_or(text.len(), |next| next.start);
            let content = separator_re
                .replace_all(text[marker.end..end].trim(), "")
                .trim()
                .to_string();
            if content.len() > 50 {
                let ordinal = marker.ordinal.unwrap_or(i as u32 + 1);
                sections.push(Section::new(marker.name.clone(), ordinal, content));
            }
        }

        non_empty(sections)
    }
}

/// "1. Title" numbered-section layout.
pub struct NumberedSections;

impl SectionStrategy for NumberedSections {
    fn name(&self) -> &'static str {
        "numbered-sections"
    }

    fn detect(&self, text: &str) -> Option<Vec<Section>> {
        let re = Regex::new(r"\n(\d+)\.\s+([A-Z][^\n]+)").ok()?;

        let markers = collect_markers(&re, text, |caps| {
            let num = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let title = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
            (
                format!("{num}. {}", truncate_chars(title, 50)),
                num.parse().ok(),
            )
        });

        if markers.len() < 3 {
            return None;
        }
        debug!("Detected numbered sections: {}", markers.len());
        non_empty(sections_from_markers(text, &markers, "Introduction", 0))
    }
}

/// Fallback: group blank-line-delimited paragraphs into synthetic sections
/// of roughly [`PARAGRAPH_GROUP_BUDGET`] characters, named after their first
/// sentence.
pub struct ParagraphGroups;

impl SectionStrategy for ParagraphGroups {
    fn name(&self) -> &'static str {
        "paragraph-groups"
    }

    fn detect(&self, text: &str) -> Option<Vec<Section>> {
        let paragraphs: Vec<&str> = split_paragraphs(text)
            .into_iter()
            .filter(|p| p.len() > PARAGRAPH_MIN_LEN)
            .collect();

        if paragraphs.is_empty() {
            return None;
        }

        let mut sections = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_len = 0;
        let mut section_num: u32 = 1;

        for para in paragraphs {
            current.push(para);
            current_len += para.len();

            if current_len >= PARAGRAPH_GROUP_BUDGET {
                sections.push(paragraph_group(&current, section_num));
                current.clear();
                current_len = 0;
                section_num += 1;
            }
        }

        if !current.is_empty() {
            sections.push(paragraph_group(&current, section_num));
        }

        debug!("Grouped paragraphs into {} sections", sections.len());
        non_empty(sections)
    }
}

fn paragraph_group(paragraphs: &[&str], section_num: u32) -> Section {
    let content = paragraphs.join("\n\n");
    let first_sentence = content.split('.').next().unwrap_or(&content);
    let name = format!(
        "Section {section_num}: {}...",
        truncate_chars(first_sentence, 60)
    );
    Section::new(name, section_num, content)
}

/// Split on blank-line boundaries (lines that are empty after trimming).
fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut paragraphs = Vec::new();
    let mut start = 0;
    let mut cursor = 0;

    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            let para = text[start..cursor].trim();
            if !para.is_empty() {
                paragraphs.push(para);
            }
            start = cursor + line.len();
        }
        cursor += line.len();
    }

    let para = text[start..].trim();
    if !para.is_empty() {
        paragraphs.push(para);
    }

    paragraphs
}
