//! Rendering aggregates into a context string.

use crate::aggregate::SectionAggregate;

/// Returned when a query matched nothing.
pub const NO_CONTEXT: &str = "No context found.";

/// Renders section aggregates as numbered, bulleted plain text.
///
/// Consecutive chunks of a section are stitched back together: when two
/// chunks sit at adjacent ranks, the second one's leading overlap is
/// stripped and its remainder appended to the running bullet, so the reader
/// sees one continuous passage instead of repeated seams.
pub struct Formatter {
    overlap: usize,
}

impl Formatter {
    /// Create a formatter for chunks produced with the given overlap.
    pub fn new(overlap: usize) -> Self {
        Self { overlap }
    }

    /// Format aggregates for prompt injection.
    pub fn format(&self, aggregates: &[SectionAggregate]) -> String {
        if aggregates.is_empty() {
            return NO_CONTEXT.to_string();
        }

        let mut lines: Vec<String> = Vec::new();

        for (i, aggregate) in aggregates.iter().enumerate() {
            let header = match &aggregate.kind {
                Some(kind) => format!("{}. {} - {kind}:", i + 1, aggregate.section),
                None => format!("{}. {}:", i + 1, aggregate.section),
            };
            lines.push(header);

            if aggregate.chunks.is_empty() {
                lines.push("\t- No content available.".to_string());
                continue;
            }

            let mut prev: i64 = -1;
            for (rank, chunk) in aggregate.ranks.iter().zip(&aggregate.chunks) {
                let rank = *rank as i64;
                if prev >= 0 && rank - prev <= 1 {
                    // Adjacent chunk: strip the shared overlap and extend
                    // the current bullet
                    let tail = &chunk[floor_char_boundary(chunk, self.overlap)..];
                    if let Some(last) = lines.last_mut() {
                        last.push_str(tail);
                    }
                } else {
                    lines.push(format!("\t- {chunk}"));
                }
                prev = rank;
            }
        }

        lines.join("\n")
    }
}

/// Largest index `<= index` that lies on a char boundary.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut index = index;
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
