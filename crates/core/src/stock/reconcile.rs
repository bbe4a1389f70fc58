use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::domain::balance::ReconciledBalance;
use crate::domain::entry::{LotLabel, StockEntry};
use crate::domain::sale::Sale;

#[derive(Default)]
struct LotTotals {
    entered: i64,
    sold: i64,
}

/// Net stock balances per `(product, lot)`.
///
/// Entries add to a lot, sales subtract. A pair present on either side
/// produces exactly one row; sales against a lot with no entry rows keep
/// their negative saldo and carry no metadata. Exhausted lots (saldo zero)
/// drop the expiry date from the output.
pub fn reconcile(entries: &[StockEntry], sales: &[Sale]) -> Vec<ReconciledBalance> {
    let mut totals: BTreeMap<(String, LotLabel), LotTotals> = BTreeMap::new();

    for entry in entries {
        let slot = totals.entry((entry.product.clone(), entry.lot.clone())).or_default();
        slot.entered += entry.quantity;
    }

    for sale in sales {
        let slot = totals.entry((sale.product.clone(), sale.lot.clone())).or_default();
        slot.sold -= sale.quantity;
    }

    let mut balances: Vec<ReconciledBalance> = totals
        .into_iter()
        .map(|((product, lot), lot_totals)| {
            // Metadata comes from the first entry row for the pair. The
            // recorder never mints a duplicate (product, lot), so later rows
            // only exist after out-of-band sheet edits.
            let metadata = entries.iter().find(|e| e.product == product && e.lot == lot);

            let saldo = lot_totals.entered + lot_totals.sold;
            let unit_cost = metadata.map(|e| e.unit_cost).unwrap_or_default();
            let expiry_date = if saldo == 0 { None } else { metadata.map(|e| e.expiry_date) };

            ReconciledBalance {
                product,
                lot,
                quantity_entered: lot_totals.entered,
                quantity_sold: lot_totals.sold,
                saldo,
                entry_date: metadata.map(|e| e.entry_date),
                expiry_date,
                unit_cost,
                sector: metadata.map(|e| e.sector.clone()).unwrap_or_default(),
                total_cost_exposure: Decimal::from(saldo) * unit_cost,
            }
        })
        .collect();

    balances.sort_by(|a, b| {
        (a.product.as_str(), a.lot.number().unwrap_or(u32::MAX), a.lot.0.as_str()).cmp(&(
            b.product.as_str(),
            b.lot.number().unwrap_or(u32::MAX),
            b.lot.0.as_str(),
        ))
    });

    balances
}
