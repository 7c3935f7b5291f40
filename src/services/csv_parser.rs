use tracing::{error, info};

use crate::error::AppError;
use crate::models::sheet::ParsedCsv;

/// Parse uploaded CSV text into a header and data rows.
///
/// Line endings are normalized to LF and blank lines dropped before
/// tokenizing. A quoted field may still span lines, but any CR or blank
/// line inside it is normalized away.
pub fn parse_csv(content: &str) -> Result<ParsedCsv, AppError> {
    parse_rows(content)
        .map(|parsed| {
            info!(
                "📊 Parsed CSV: {} data rows, {} columns",
                parsed.rows.len(),
                parsed.header.len()
            );
            parsed
        })
        .map_err(|cause| {
            error!("❌ CSV parsing failed: {}", cause);
            AppError::Validation(format!("Invalid CSV format: {}", cause))
        })
}

fn parse_rows(content: &str) -> Result<ParsedCsv, String> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() <= 1 {
        return Err("CSV must contain at least header and one data row".into());
    }

    let joined = lines.join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(joined.as_bytes());

    let mut parsed_rows = Vec::with_capacity(lines.len());
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        if record.is_empty() {
            continue;
        }
        parsed_rows.push(record.iter().map(|cell| cell.trim().to_string()).collect::<Vec<_>>());
    }

    let mut rows = parsed_rows.into_iter();
    let header = rows.next().unwrap_or_default();
    Ok(ParsedCsv {
        header,
        rows: rows.collect(),
    })
}
