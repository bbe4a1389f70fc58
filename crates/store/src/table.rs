use serde::{Deserialize, Serialize};

/// Column schema of the stock-entries table (`registro_estoque`).
pub const ENTRY_COLUMNS: [&str; 8] = [
    "Product",
    "Lot",
    "Quantity",
    "Sector",
    "Entry Date",
    "Expiry Date",
    "Cost",
    "Sale Value",
];

/// Column schema of the sales table (`vendas`).
pub const SALES_COLUMNS: [&str; 8] = [
    "Sale Code",
    "Product",
    "Lot",
    "Quantity",
    "Payment Method",
    "Sale Date",
    "Unit Value",
    "Total Value",
];

/// One remote table as the service sees it: a header row plus textual data
/// rows. The service is untyped; typing happens in the codec.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// Empty table typed with a fixed column schema. Used uniformly whether
    /// the source table was absent, read back empty, or is being rebuilt
    /// for a write.
    pub fn with_schema(columns: &[&str]) -> Self {
        Self {
            headers: columns.iter().map(|column| (*column).to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{SheetTable, ENTRY_COLUMNS, SALES_COLUMNS};

    #[test]
    fn schema_tables_start_empty_with_all_columns() {
        let entries = SheetTable::with_schema(&ENTRY_COLUMNS);
        assert!(entries.is_empty());
        assert_eq!(entries.headers.len(), 8);
        assert_eq!(entries.headers[0], "Product");

        let sales = SheetTable::with_schema(&SALES_COLUMNS);
        assert_eq!(sales.headers[0], "Sale Code");
        assert_eq!(sales.headers[7], "Total Value");
    }
}
