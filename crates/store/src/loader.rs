use std::sync::Arc;
use std::time::{Duration, Instant};

use estoque_core::domain::entry::StockEntry;
use estoque_core::domain::sale::Sale;
use tokio::sync::Mutex;
use tracing::debug;

use crate::codec;
use crate::table::{SheetTable, ENTRY_COLUMNS, SALES_COLUMNS};
use crate::{RecordStore, StoreError};

/// Both datasets as read in one pass. Pure data; recomputed views derive
/// from it per request.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub entries: Vec<StockEntry>,
    pub sales: Vec<Sale>,
}

struct CachedSnapshot {
    taken_at: Instant,
    snapshot: Snapshot,
}

/// Reads both tables into a typed snapshot, degrading a missing or empty
/// table to the empty typed table so downstream aggregation never sees a
/// missing column.
///
/// Reads are cached for a short TTL; callers tolerate staleness inside the
/// window. `reload` is the only coherence mechanism and must follow every
/// write.
pub struct DatasetLoader {
    store: Arc<dyn RecordStore>,
    entries_table: String,
    sales_table: String,
    ttl: Duration,
    cache: Mutex<Option<CachedSnapshot>>,
}

impl DatasetLoader {
    pub fn new(
        store: Arc<dyn RecordStore>,
        entries_table: impl Into<String>,
        sales_table: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            entries_table: entries_table.into(),
            sales_table: sales_table.into(),
            ttl,
            cache: Mutex::new(None),
        }
    }

    pub async fn load(&self) -> Result<Snapshot, StoreError> {
        {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.as_ref() {
                if cached.taken_at.elapsed() < self.ttl {
                    return Ok(cached.snapshot.clone());
                }
            }
        }

        self.reload().await
    }

    /// Bypasses and refreshes the cache.
    pub async fn reload(&self) -> Result<Snapshot, StoreError> {
        let entries_sheet = self.read_or_empty(&self.entries_table, &ENTRY_COLUMNS).await?;
        let sales_sheet = self.read_or_empty(&self.sales_table, &SALES_COLUMNS).await?;

        let snapshot = Snapshot {
            entries: codec::decode_entries(&self.entries_table, &entries_sheet)?,
            sales: codec::decode_sales(&self.sales_table, &sales_sheet)?,
        };

        debug!(
            event_name = "store.loader.reloaded",
            entry_rows = snapshot.entries.len(),
            sale_rows = snapshot.sales.len(),
            "datasets reloaded from record store"
        );

        *self.cache.lock().await =
            Some(CachedSnapshot { taken_at: Instant::now(), snapshot: snapshot.clone() });

        Ok(snapshot)
    }

    async fn read_or_empty(
        &self,
        name: &str,
        schema: &[&str],
    ) -> Result<SheetTable, StoreError> {
        match self.store.read_table(name).await? {
            Some(table) if !table.is_empty() => Ok(table),
            // Absent and empty both degrade to the empty typed table.
            _ => Ok(SheetTable::with_schema(schema)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::NaiveDate;
    use estoque_core::domain::entry::{LotLabel, StockEntry};
    use rust_decimal::Decimal;

    use crate::codec::encode_entries;
    use crate::memory::MemoryStore;

    use super::DatasetLoader;

    fn entry(product: &str, quantity: i64) -> StockEntry {
        StockEntry {
            product: product.to_string(),
            lot: LotLabel::numbered(1),
            quantity,
            sector: "GROCERY".to_string(),
            entry_date: NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date"),
            expiry_date: NaiveDate::from_ymd_opt(2024, 9, 1).expect("valid date"),
            unit_cost: Decimal::ONE,
            sale_unit_price: Decimal::TWO,
        }
    }

    fn loader(store: Arc<MemoryStore>, ttl: Duration) -> DatasetLoader {
        DatasetLoader::new(store, "registro_estoque", "vendas", ttl)
    }

    #[tokio::test]
    async fn missing_tables_load_as_an_empty_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let snapshot = loader(store, Duration::ZERO).load().await.expect("load");

        assert!(snapshot.entries.is_empty());
        assert!(snapshot.sales.is_empty());
    }

    #[tokio::test]
    async fn load_within_the_ttl_serves_the_cached_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let loader = loader(store.clone(), Duration::from_secs(60));

        let first = loader.load().await.expect("load");
        assert!(first.entries.is_empty());

        store
            .insert_table("registro_estoque", encode_entries(&[entry("APPLE", 5)]))
            .await;

        // Still inside the TTL window: staleness is tolerated.
        let second = loader.load().await.expect("load");
        assert!(second.entries.is_empty());
    }

    #[tokio::test]
    async fn reload_bypasses_the_cache() {
        let store = Arc::new(MemoryStore::new());
        let loader = loader(store.clone(), Duration::from_secs(60));

        loader.load().await.expect("load");
        store
            .insert_table("registro_estoque", encode_entries(&[entry("APPLE", 5)]))
            .await;

        let reloaded = loader.reload().await.expect("reload");
        assert_eq!(reloaded.entries.len(), 1);
        assert_eq!(reloaded.entries[0].product, "APPLE");

        // And the refreshed cache now serves the new rows.
        let cached = loader.load().await.expect("load");
        assert_eq!(cached.entries.len(), 1);
    }

    #[tokio::test]
    async fn zero_ttl_disables_caching() {
        let store = Arc::new(MemoryStore::new());
        let loader = loader(store.clone(), Duration::ZERO);

        loader.load().await.expect("load");
        store
            .insert_table("registro_estoque", encode_entries(&[entry("APPLE", 5)]))
            .await;

        let second = loader.load().await.expect("load");
        assert_eq!(second.entries.len(), 1);
    }
}
