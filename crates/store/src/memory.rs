use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::table::SheetTable;
use crate::{RecordStore, StoreError};

/// In-process record store used by tests, the seed command, and local
/// development. Tables exist only after the first overwrite, which mirrors
/// the remote service's table-not-found behavior.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, SheetTable>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/seed helper: place a table directly, bypassing the writer.
    pub async fn insert_table(&self, name: &str, table: SheetTable) {
        self.tables.write().await.insert(name.to_string(), table);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn read_table(&self, name: &str) -> Result<Option<SheetTable>, StoreError> {
        Ok(self.tables.read().await.get(name).cloned())
    }

    async fn overwrite_table(&self, name: &str, table: &SheetTable) -> Result<(), StoreError> {
        self.tables.write().await.insert(name.to_string(), table.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::table::{SheetTable, ENTRY_COLUMNS};
    use crate::RecordStore;

    use super::MemoryStore;

    #[tokio::test]
    async fn unknown_table_reads_as_not_found() {
        let store = MemoryStore::new();
        assert!(store.read_table("registro_estoque").await.expect("read").is_none());
    }

    #[tokio::test]
    async fn overwrite_replaces_the_full_table() {
        let store = MemoryStore::new();

        let mut first = SheetTable::with_schema(&ENTRY_COLUMNS);
        first.push_row(vec!["A".to_string(); 8]);
        store.overwrite_table("registro_estoque", &first).await.expect("write");

        let second = SheetTable::with_schema(&ENTRY_COLUMNS);
        store.overwrite_table("registro_estoque", &second).await.expect("write");

        let read = store.read_table("registro_estoque").await.expect("read").expect("exists");
        assert!(read.is_empty());
    }
}
