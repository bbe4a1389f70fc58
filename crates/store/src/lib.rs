pub mod codec;
pub mod loader;
pub mod memory;
pub mod remote;
pub mod table;
pub mod writer;

use async_trait::async_trait;
use thiserror::Error;

pub use loader::{DatasetLoader, Snapshot};
pub use memory::MemoryStore;
pub use remote::RemoteSheetStore;
pub use table::SheetTable;
pub use writer::PersistenceWriter;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("record store returned status {status} for table `{table}`")]
    RemoteStatus { table: String, status: u16 },
    #[error("table `{table}` row {row}, column `{column}`: {detail}")]
    Decode { table: String, row: usize, column: String, detail: String },
}

/// Remote tabular persistence service: named tables, each a header row plus
/// data rows, with full-table read and full-table overwrite as the only
/// operations.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// `Ok(None)` means the table does not exist, a distinct condition from
    /// an existing-but-empty table.
    async fn read_table(&self, name: &str) -> Result<Option<SheetTable>, StoreError>;

    /// Replaces the entire table (header row + data rows) in one call.
    async fn overwrite_table(&self, name: &str, table: &SheetTable) -> Result<(), StoreError>;
}
