/// Convert a 1-based column index to spreadsheet letters (1 => A, 27 => AA).
/// Zero has no letter form and yields an empty string.
pub fn column_letter(column: u32) -> String {
    let mut n = column;
    let mut letters = Vec::new();
    while n > 0 {
        let remainder = (n - 1) % 26;
        letters.push((b'A' + remainder as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Quote a sheet title for use in A1 notation ('My Sheet', quotes doubled)
pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Build a sheet-qualified A1 range such as `'Log'!B5:D7`
pub fn a1_range(sheet_title: &str, start_col: u32, start_row: u32, end_col: u32, end_row: u32) -> String {
    format!(
        "{}!{}{}:{}{}",
        quote_sheet_title(sheet_title),
        column_letter(start_col),
        start_row,
        column_letter(end_col),
        end_row
    )
}
