use chrono::NaiveDate;
use estoque_core::domain::entry::{LotLabel, StockEntry};
use estoque_core::domain::sale::Sale;
use rust_decimal::Decimal;

use crate::table::{SheetTable, ENTRY_COLUMNS, SALES_COLUMNS};
use crate::StoreError;

/// Fixed textual date representation for every date-typed field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Fixed-point two-decimal text with `.` as the separator regardless of
/// locale.
pub fn format_money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

pub fn encode_entries(entries: &[StockEntry]) -> SheetTable {
    let mut table = SheetTable::with_schema(&ENTRY_COLUMNS);
    for entry in entries {
        table.push_row(vec![
            entry.product.clone(),
            entry.lot.0.clone(),
            entry.quantity.to_string(),
            entry.sector.clone(),
            format_date(entry.entry_date),
            format_date(entry.expiry_date),
            format_money(entry.unit_cost),
            format_money(entry.sale_unit_price),
        ]);
    }
    table
}

pub fn decode_entries(
    table_name: &str,
    table: &SheetTable,
) -> Result<Vec<StockEntry>, StoreError> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let cells = RowCells::new(table_name, &ENTRY_COLUMNS, index, row);
            Ok(StockEntry {
                product: cells.text(0)?,
                lot: LotLabel(cells.text(1)?),
                quantity: cells.quantity(2)?,
                sector: cells.text(3)?,
                entry_date: cells.date(4)?,
                expiry_date: cells.date(5)?,
                unit_cost: cells.money(6)?,
                sale_unit_price: cells.money(7)?,
            })
        })
        .collect()
}

pub fn encode_sales(sales: &[Sale]) -> SheetTable {
    let mut table = SheetTable::with_schema(&SALES_COLUMNS);
    for sale in sales {
        table.push_row(vec![
            sale.sale_code.clone(),
            sale.product.clone(),
            sale.lot.0.clone(),
            sale.quantity.to_string(),
            sale.payment_method.clone(),
            format_date(sale.sale_date),
            format_money(sale.unit_value),
            format_money(sale.total_value),
        ]);
    }
    table
}

pub fn decode_sales(table_name: &str, table: &SheetTable) -> Result<Vec<Sale>, StoreError> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let cells = RowCells::new(table_name, &SALES_COLUMNS, index, row);
            Ok(Sale {
                sale_code: cells.text(0)?,
                product: cells.text(1)?,
                lot: LotLabel(cells.text(2)?),
                quantity: cells.quantity(3)?,
                payment_method: cells.text(4)?,
                sale_date: cells.date(5)?,
                unit_value: cells.money(6)?,
                total_value: cells.money(7)?,
            })
        })
        .collect()
}

/// Positional access to one data row, with decode errors that name the
/// table, the 1-based data row, and the schema column.
struct RowCells<'a> {
    table: &'a str,
    columns: &'a [&'a str],
    row: usize,
    cells: &'a [String],
}

impl<'a> RowCells<'a> {
    fn new(table: &'a str, columns: &'a [&'a str], index: usize, cells: &'a [String]) -> Self {
        Self { table, columns, row: index + 1, cells }
    }

    fn error(&self, column: usize, detail: String) -> StoreError {
        StoreError::Decode {
            table: self.table.to_string(),
            row: self.row,
            column: self.columns.get(column).copied().unwrap_or("?").to_string(),
            detail,
        }
    }

    fn raw(&self, column: usize) -> Result<&str, StoreError> {
        self.cells
            .get(column)
            .map(String::as_str)
            .ok_or_else(|| self.error(column, "missing cell".to_string()))
    }

    fn text(&self, column: usize) -> Result<String, StoreError> {
        Ok(self.raw(column)?.trim().to_string())
    }

    fn quantity(&self, column: usize) -> Result<i64, StoreError> {
        let raw = self.raw(column)?.trim();
        raw.parse::<i64>()
            .map_err(|_| self.error(column, format!("`{raw}` is not an integer quantity")))
    }

    fn date(&self, column: usize) -> Result<NaiveDate, StoreError> {
        let raw = self.raw(column)?.trim();
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|_| self.error(column, format!("`{raw}` is not a `{DATE_FORMAT}` date")))
    }

    fn money(&self, column: usize) -> Result<Decimal, StoreError> {
        let raw = self.raw(column)?.trim();
        raw.parse::<Decimal>()
            .map_err(|_| self.error(column, format!("`{raw}` is not a decimal amount")))
    }
}
