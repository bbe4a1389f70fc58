use crate::domain::entry::{LotLabel, StockEntry};
use crate::errors::DomainError;

/// Next lot label for a product: one-based, monotonically increasing.
///
/// A prior label for the product that carries no digit run rejects the
/// whole operation instead of being skipped: skipping could re-issue a
/// number already in use and corrupt the `(product, lot)` key.
pub fn next_lot(product: &str, entries: &[StockEntry]) -> Result<LotLabel, DomainError> {
    let mut highest: Option<u32> = None;

    for entry in entries.iter().filter(|e| e.product == product) {
        match entry.lot.number() {
            Some(n) => highest = Some(highest.map_or(n, |h| h.max(n))),
            None => {
                return Err(DomainError::MalformedLotLabel {
                    product: product.to_string(),
                    label: entry.lot.0.clone(),
                });
            }
        }
    }

    Ok(LotLabel::numbered(highest.map_or(1, |h| h + 1)))
}
