/// CSV payload split into its header and data rows, every cell trimmed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCsv {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ParsedCsv {
    /// Width of the widest data row, at least 1
    pub fn max_columns(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0).max(1)
    }
}

/// A single tab of a remote spreadsheet. Every mutation goes through the
/// sheets client; nothing here is cached beyond the metadata read at open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    pub spreadsheet_id: String,
    pub spreadsheet_title: String,
    pub sheet_id: i64,
    pub title: String,
    pub row_count: u32,
    pub col_count: u32,
}
