use std::sync::Arc;

use estoque_core::domain::entry::StockEntry;
use estoque_core::domain::sale::Sale;
use tracing::info;

use crate::codec;
use crate::loader::DatasetLoader;
use crate::{RecordStore, StoreError};

/// Normalizes both datasets to their fixed textual representation and
/// overwrites both remote tables, then reloads the loader so in-memory
/// state reflects the just-normalized text.
///
/// Each write is a full replace with no concurrency token or row locking:
/// two writers saving at once race, and the last overwrite wins. That
/// lost-update hazard is a property of the backing service, not something
/// this layer papers over.
pub struct PersistenceWriter {
    store: Arc<dyn RecordStore>,
    loader: Arc<DatasetLoader>,
    entries_table: String,
    sales_table: String,
}

impl PersistenceWriter {
    pub fn new(
        store: Arc<dyn RecordStore>,
        loader: Arc<DatasetLoader>,
        entries_table: impl Into<String>,
        sales_table: impl Into<String>,
    ) -> Self {
        Self {
            store,
            loader,
            entries_table: entries_table.into(),
            sales_table: sales_table.into(),
        }
    }

    pub async fn save(&self, entries: &[StockEntry], sales: &[Sale]) -> Result<(), StoreError> {
        let sales_sheet = codec::encode_sales(sales);
        let entries_sheet = codec::encode_entries(entries);

        self.store.overwrite_table(&self.sales_table, &sales_sheet).await?;
        self.store.overwrite_table(&self.entries_table, &entries_sheet).await?;

        info!(
            event_name = "store.writer.saved",
            entry_rows = entries.len(),
            sale_rows = sales.len(),
            "both tables overwritten"
        );

        self.loader.reload().await?;
        Ok(())
    }
}
