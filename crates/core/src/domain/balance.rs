use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::entry::LotLabel;

/// Net balance for one `(product, lot)` cohort, derived per view request.
///
/// Never persisted: a pure function of the two source tables at read time.
/// `quantity_sold` is stored negative so `saldo` is a plain sum. Metadata
/// fields are `None`/zero for orphan rows (sales against a lot with no
/// entry rows).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconciledBalance {
    pub product: String,
    pub lot: LotLabel,
    pub quantity_entered: i64,
    pub quantity_sold: i64,
    pub saldo: i64,
    pub entry_date: Option<NaiveDate>,
    /// Cleared for exhausted lots: a zero saldo carries no actionable expiry.
    pub expiry_date: Option<NaiveDate>,
    pub unit_cost: Decimal,
    pub sector: String,
    pub total_cost_exposure: Decimal,
}
