use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lot identifier in the canonical `LOT {n}` form.
///
/// Labels are minted by the entry recorder and are one-based and
/// monotonically increasing per product. The backing sheet can be edited by
/// hand, so a label is not guaranteed to parse back to a number.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LotLabel(pub String);

impl LotLabel {
    pub fn numbered(n: u32) -> Self {
        Self(format!("LOT {n}"))
    }

    /// Leading integer of the first digit run in the label, if any.
    pub fn number(&self) -> Option<u32> {
        let digits: String = self
            .0
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();

        digits.parse().ok()
    }
}

impl fmt::Display for LotLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One incoming stock lot. Immutable once persisted except via the
/// full-table rewrite the persistence writer performs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    pub product: String,
    pub lot: LotLabel,
    pub quantity: i64,
    pub sector: String,
    pub entry_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub unit_cost: Decimal,
    pub sale_unit_price: Decimal,
}
