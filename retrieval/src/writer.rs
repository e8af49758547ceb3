//! Writing parsed documents into the store.

use std::sync::Arc;

use tracing::{info, warn};

use passage_embeddings::Embedder;
use passage_ingest::{DocumentBuilder, Section};
use passage_store::Store;

use crate::error::Result;

/// Chunks embedded per provider call.
const EMBED_BATCH_SIZE: usize = 32;

/// Embeds document records and writes them to a store table.
///
/// Writing replaces the table wholesale; a failed drop of the previous
/// table is logged and ignored, since create overwrites anyway.
pub struct IndexWriter {
    builder: DocumentBuilder,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl IndexWriter {
    /// Create a writer with the default batch size.
    pub fn new(builder: DocumentBuilder, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            builder,
            embedder,
            batch_size: EMBED_BATCH_SIZE,
        }
    }

    /// Override the embedding batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Build, embed, and write records for the given sections.
    ///
    /// Returns the number of rows written.
    pub async fn write(
        &self,
        store: &Store,
        table_name: &str,
        sections: &[Section],
    ) -> Result<usize> {
        let mut records = self.builder.build(sections);
        let total = records.len();
        info!(
            "Writing {total} records from {} sections to table '{table_name}'",
            sections.len()
        );

        let mut done = 0;
        for batch in records.chunks_mut(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|r| r.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            for (record, vector) in batch.iter_mut().zip(vectors) {
                record.vector = vector;
            }
            done += batch.len();
            info!("Embedded {done}/{total} chunks");
        }

        if let Err(err) = store.drop_table(table_name).await {
            warn!("Could not drop existing table '{table_name}': {err}");
        }

        let mut table = store.create_table(table_name, records).await?;

        // Lexical search is a bonus; vector search works without it
        if let Err(err) = table.create_lexical_index() {
            warn!("Lexical index creation failed for '{table_name}': {err}");
        }

        Ok(total)
    }
}
