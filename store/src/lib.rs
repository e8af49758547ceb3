//! # Passage store
//!
//! Embedded document store backing the retrieval pipeline. A [`Store`] is a
//! directory of named tables; a [`Table`] holds the chunk records of one
//! knowledge base, persisted as JSON, with cosine vector search, typed
//! filtered scans, and an optional lexical (inverted) index over the chunk
//! text.
//!
//! Tables are rebuilt wholesale: ingestion drops and recreates rather than
//! updating in place, so a failed run can simply be re-run.

pub mod connection;
pub mod error;
pub mod lexical;
pub mod record;
pub mod table;

pub use connection::Store;
pub use error::{Result, StoreError};
pub use lexical::LexicalIndex;
pub use record::DocumentRecord;
pub use table::{Filter, SearchBuilder, Table};
