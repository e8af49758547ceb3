//! # Ingestion
//!
//! The offline half of the retrieval pipeline: raw text goes in, indexable
//! document records come out.
//!
//! ```text
//! raw text ──► SectionParser ──► Chunker ──► DocumentBuilder ──► records
//! ```
//!
//! The [`SectionParser`] splits a document into logical sections using a
//! cascade of detection strategies (study guides, plays, part/chapter
//! novels, page dumps, numbered notes) with a paragraph-grouping fallback,
//! so it never fails and never returns an empty result. The [`Chunker`]
//! carves each section into overlapping windows snapped to sentence
//! boundaries, and the [`DocumentBuilder`] turns the `(section, chunk)`
//! pairs into typed records with stable rank and hash bookkeeping.

pub mod chunker;
pub mod document;
pub mod error;
pub mod parser;
pub mod section;
pub mod strategy;

pub use chunker::{Chunker, ChunkerConfig};
pub use document::{DocumentBuilder, short_hash};
pub use error::{IngestError, Result};
pub use parser::SectionParser;
pub use section::Section;
pub use strategy::SectionStrategy;
