use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::entry::LotLabel;

/// One sale row from the `vendas` table.
///
/// Sales are recorded by an external path; this system only reads them.
/// A sale references a `(product, lot)` pair but no referential-integrity
/// check is enforced against the stock-entry table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub sale_code: String,
    pub product: String,
    pub lot: LotLabel,
    pub quantity: i64,
    pub payment_method: String,
    pub sale_date: NaiveDate,
    pub unit_value: Decimal,
    pub total_value: Decimal,
}
