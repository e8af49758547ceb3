//! Store connection and table persistence.
//!
//! A [`Store`] is a root directory holding one JSON file per table. Writes
//! go through a temp file and rename so a crash mid-write never leaves a
//! half-serialized table behind.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::record::DocumentRecord;
use crate::table::Table;

/// Connection to a store directory.
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Open a store at the given root directory, creating it if needed.
    pub async fn connect(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn table_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    /// Create (or overwrite) a table with the given records.
    pub async fn create_table(
        &self,
        name: &str,
        records: Vec<DocumentRecord>,
    ) -> Result<Table> {
        let path = self.table_path(name);
        let content = serde_json::to_string(&records)?;

        // Write atomically using a temp file
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, &path).await?;

        info!("Created table '{}' with {} rows", name, records.len());
        Ok(Table::new(name, records))
    }

    /// Drop a table. Dropping an absent table is not an error.
    pub async fn drop_table(&self, name: &str) -> Result<()> {
        let path = self.table_path(name);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Dropped table '{name}'");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Open an existing table.
    pub async fn open_table(&self, name: &str) -> Result<Table> {
        let path = self.table_path(name);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::TableNotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let records: Vec<DocumentRecord> = serde_json::from_str(&content)?;
        debug!("Opened table '{}' with {} rows", name, records.len());
        Ok(Table::new(name, records))
    }

    /// Check whether a table exists.
    pub fn table_exists(&self, name: &str) -> bool {
        self.table_path(name).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn record(text: &str) -> DocumentRecord {
        DocumentRecord {
            text: text.to_string(),
            section: "Chapter 1".to_string(),
            section_num: 1,
            kind: None,
            section_hash: "s1".to_string(),
            content_hash: text.to_string(),
            rank_in_section: 0,
            relative_rank: 0.0,
            sibling_count: 1,
            vector: vec![1.0, 0.0],
        }
    }

    #[tokio::test]
    async fn test_create_and_open_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = Store::connect(dir.path()).await.unwrap();

        store
            .create_table("kb", vec![record("alpha"), record("beta")])
            .await
            .unwrap();

        let table = store.open_table("kb").await.unwrap();
        assert_eq!(table.count_rows(), 2);
        assert_eq!(table.records()[0].text, "alpha");
    }

    #[tokio::test]
    async fn test_open_missing_table() {
        let dir = TempDir::new().unwrap();
        let store = Store::connect(dir.path()).await.unwrap();

        let err = store.open_table("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::TableNotFound(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_drop_absent_table_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = Store::connect(dir.path()).await.unwrap();
        store.drop_table("ghost").await.unwrap();
    }

    #[tokio::test]
    async fn test_drop_then_recreate() {
        let dir = TempDir::new().unwrap();
        let store = Store::connect(dir.path()).await.unwrap();

        store.create_table("kb", vec![record("old")]).await.unwrap();
        store.drop_table("kb").await.unwrap();
        assert!(!store.table_exists("kb"));

        store.create_table("kb", vec![record("new")]).await.unwrap();
        let table = store.open_table("kb").await.unwrap();
        assert_eq!(table.count_rows(), 1);
        assert_eq!(table.records()[0].text, "new");
    }
}
