use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use estoque_core::config::{AppConfig, LoadOptions, StoreBackend};
use estoque_core::domain::entry::{LotLabel, StockEntry};
use estoque_core::domain::sale::Sale;
use estoque_store::{
    DatasetLoader, MemoryStore, PersistenceWriter, RecordStore, RemoteSheetStore,
};
use rust_decimal::Decimal;

use super::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult {
                exit_code: 1,
                output: format!("seed: failed to load configuration: {error}"),
            };
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult {
                exit_code: 1,
                output: format!("seed: failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let store: Arc<dyn RecordStore> = match config.store.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Remote => {
                let base_url = config.store.base_url.clone().unwrap_or_default();
                let access_token =
                    config.store.access_token.clone().unwrap_or_else(|| String::new().into());
                Arc::new(
                    RemoteSheetStore::new(
                        base_url,
                        access_token,
                        Duration::from_secs(config.store.timeout_secs),
                    )
                    .map_err(|error| format!("failed to build store client: {error}"))?,
                )
            }
        };

        let loader = Arc::new(DatasetLoader::new(
            store.clone(),
            config.store.entries_table.clone(),
            config.store.sales_table.clone(),
            Duration::from_secs(config.store.cache_ttl_secs),
        ));
        let writer = PersistenceWriter::new(
            store,
            loader,
            config.store.entries_table.clone(),
            config.store.sales_table.clone(),
        );

        let entries = demo_entries();
        let sales = demo_sales();
        writer
            .save(&entries, &sales)
            .await
            .map_err(|error| format!("failed to persist demo data: {error}"))?;

        Ok::<String, String>(format!(
            "seed: wrote {} stock entries and {} sales to the {} backend",
            entries.len(),
            sales.len(),
            config.store.backend
        ))
    });

    match result {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult { exit_code: 1, output: format!("seed: {error}") },
    }
}

fn demo_date(month: u32, day: u32) -> NaiveDate {
    // Seed data is deterministic on purpose: the same fixture every run.
    NaiveDate::from_ymd_opt(2024, month, day).unwrap_or_default()
}

fn demo_entries() -> Vec<StockEntry> {
    vec![
        StockEntry {
            product: "TOMATO".to_string(),
            lot: LotLabel::numbered(1),
            quantity: 40,
            sector: "PRODUCE".to_string(),
            entry_date: demo_date(3, 1),
            expiry_date: demo_date(3, 18),
            unit_cost: Decimal::new(250, 2),
            sale_unit_price: Decimal::new(499, 2),
        },
        StockEntry {
            product: "TOMATO".to_string(),
            lot: LotLabel::numbered(2),
            quantity: 25,
            sector: "PRODUCE".to_string(),
            entry_date: demo_date(3, 8),
            expiry_date: demo_date(3, 25),
            unit_cost: Decimal::new(240, 2),
            sale_unit_price: Decimal::new(499, 2),
        },
        StockEntry {
            product: "RICE 5KG".to_string(),
            lot: LotLabel::numbered(1),
            quantity: 60,
            sector: "GROCERY".to_string(),
            entry_date: demo_date(3, 2),
            expiry_date: demo_date(12, 30),
            unit_cost: Decimal::new(1890, 2),
            sale_unit_price: Decimal::new(2590, 2),
        },
    ]
}

fn demo_sales() -> Vec<Sale> {
    vec![
        Sale {
            sale_code: "V-0001".to_string(),
            product: "TOMATO".to_string(),
            lot: LotLabel::numbered(1),
            quantity: 12,
            payment_method: "PIX".to_string(),
            sale_date: demo_date(3, 4),
            unit_value: Decimal::new(499, 2),
            total_value: Decimal::new(5988, 2),
        },
        Sale {
            sale_code: "V-0002".to_string(),
            product: "RICE 5KG".to_string(),
            lot: LotLabel::numbered(1),
            quantity: 3,
            payment_method: "CARD".to_string(),
            sale_date: demo_date(3, 5),
            unit_value: Decimal::new(2590, 2),
            total_value: Decimal::new(7770, 2),
        },
    ]
}

#[cfg(test)]
mod tests {
    use estoque_core::stock::{next_lot, reconcile};

    use super::{demo_entries, demo_sales};

    #[test]
    fn demo_lots_conform_to_the_lot_numbering_rule() {
        let entries = demo_entries();

        // Every product's next lot is derivable, so no label is malformed.
        for product in ["TOMATO", "RICE 5KG"] {
            next_lot(product, &entries).expect("demo labels must conform");
        }
    }

    #[test]
    fn demo_datasets_reconcile_without_orphans() {
        let entries = demo_entries();
        let sales = demo_sales();

        let balances = reconcile(&entries, &sales);
        assert_eq!(balances.len(), 3);
        assert!(balances.iter().all(|b| b.saldo > 0));
    }
}
