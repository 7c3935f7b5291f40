use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::sheet::Worksheet;
use crate::utils::columns::quote_sheet_title;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Authorization failed: {0}")]
    Auth(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Google Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Spreadsheet not found: {0}")]
    SpreadsheetNotFound(String),
    #[error("Worksheet not found: {0}")]
    WorksheetNotFound(String),
}

/// Authorized access to the spreadsheet API
#[async_trait]
pub trait SheetsClient: Send + Sync {
    /// Open a spreadsheet by id and select the tab titled `sheet_name`
    async fn open_worksheet(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<Worksheet, SheetsError>;

    /// Every populated row, padded to the widest row
    async fn get_all_values(&self, worksheet: &Worksheet) -> Result<Vec<Vec<String>>, SheetsError>;

    /// Write `rows` into a sheet-qualified A1 range in one request
    async fn update_range(&self, worksheet: &Worksheet, range: &str, rows: &[Vec<String>]) -> Result<(), SheetsError>;

    /// Delete 1-based rows, applied in the order given
    async fn delete_rows(&self, worksheet: &Worksheet, rows: &[u32]) -> Result<(), SheetsError>;
}

/// Produces an authorized client; one connection per resolved worksheet
#[async_trait]
pub trait SheetsConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn SheetsClient>, SheetsError>;
}

/// Sheets v4 REST client bound to one OAuth access token
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpreadsheetMeta {
    spreadsheet_id: String,
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SpreadsheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: i64,
    title: String,
    #[serde(default)]
    grid_properties: GridProperties,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GridProperties {
    #[serde(default)]
    row_count: u32,
    #[serde(default)]
    column_count: u32,
}

#[derive(Deserialize)]
struct ValueRangeBody {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

impl GoogleSheetsClient {
    pub fn new(http: reqwest::Client, access_token: String) -> Self {
        Self { http, access_token }
    }

    fn endpoint(segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url = Url::parse(SHEETS_API).map_err(|e| SheetsError::Api {
            status: 0,
            message: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Api {
                status: 0,
                message: format!("{} cannot be a base URL", SHEETS_API),
            })?
            .extend(segments);
        Ok(url)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_else(|_| "Unknown error".into());
        Err(api_error(status, body))
    }

    fn update_request(&self, worksheet: &Worksheet, range: &str, rows: &[Vec<String>]) -> Result<reqwest::Request, SheetsError> {
        let url = Self::endpoint(&[&worksheet.spreadsheet_id, "values", range])?;
        Ok(self
            .http
            .put(url)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&update_body(range, rows))
            .build()?)
    }

    fn delete_request(&self, worksheet: &Worksheet, rows: &[u32]) -> Result<reqwest::Request, SheetsError> {
        let batch = format!("{}:batchUpdate", worksheet.spreadsheet_id);
        let url = Self::endpoint(&[&batch])?;
        Ok(self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&delete_requests(worksheet.sheet_id, rows))
            .build()?)
    }
}

#[async_trait]
impl SheetsClient for GoogleSheetsClient {
    async fn open_worksheet(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<Worksheet, SheetsError> {
        let url = Self::endpoint(&[spreadsheet_id])?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[("fields", "spreadsheetId,properties.title,sheets.properties")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(open_error(spreadsheet_id, status, body));
        }
        let meta: SpreadsheetMeta = resp.json().await?;

        let sheet = meta
            .sheets
            .into_iter()
            .map(|s| s.properties)
            .find(|p| p.title == sheet_name)
            .ok_or_else(|| SheetsError::WorksheetNotFound(sheet_name.to_string()))?;

        Ok(Worksheet {
            spreadsheet_id: meta.spreadsheet_id,
            spreadsheet_title: meta.properties.title,
            sheet_id: sheet.sheet_id,
            title: sheet.title,
            row_count: sheet.grid_properties.row_count,
            col_count: sheet.grid_properties.column_count,
        })
    }

    async fn get_all_values(&self, worksheet: &Worksheet) -> Result<Vec<Vec<String>>, SheetsError> {
        let range = quote_sheet_title(&worksheet.title);
        let url = Self::endpoint(&[&worksheet.spreadsheet_id, "values", &range])?;
        let resp = self.http.get(url).bearer_auth(&self.access_token).send().await?;
        let body: ValueRangeBody = Self::check(resp).await?.json().await?;

        let rows = body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();
        Ok(pad_rows(rows))
    }

    async fn update_range(&self, worksheet: &Worksheet, range: &str, rows: &[Vec<String>]) -> Result<(), SheetsError> {
        let request = self.update_request(worksheet, range, rows)?;
        Self::check(self.http.execute(request).await?).await?;
        Ok(())
    }

    async fn delete_rows(&self, worksheet: &Worksheet, rows: &[u32]) -> Result<(), SheetsError> {
        if rows.is_empty() {
            return Ok(());
        }
        let request = self.delete_request(worksheet, rows)?;
        Self::check(self.http.execute(request).await?).await?;
        Ok(())
    }
}

/// `values.update` body; `range` must match the one in the URL
fn update_body(range: &str, rows: &[Vec<String>]) -> Value {
    json!({
        "range": range,
        "majorDimension": "ROWS",
        "values": rows,
    })
}

/// One `deleteDimension` per 1-based row, kept in the caller's order
fn delete_requests(sheet_id: i64, rows: &[u32]) -> Value {
    let requests: Vec<Value> = rows
        .iter()
        .map(|row| {
            json!({
                "deleteDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": row - 1,
                        "endIndex": row,
                    }
                }
            })
        })
        .collect();
    json!({ "requests": requests })
}

/// Prefer Google's `error.message`, falling back to the raw body
fn api_error(status: StatusCode, body: String) -> SheetsError {
    let message = serde_json::from_str::<GoogleErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);
    SheetsError::Api {
        status: status.as_u16(),
        message,
    }
}

fn open_error(spreadsheet_id: &str, status: StatusCode, body: String) -> SheetsError {
    if status == StatusCode::NOT_FOUND {
        SheetsError::SpreadsheetNotFound(spreadsheet_id.to_string())
    } else {
        api_error(status, body)
    }
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// The values API drops trailing empty cells; restore a rectangular grid
pub(crate) fn pad_rows(mut rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in rows.iter_mut() {
        row.resize(width, String::new());
    }
    rows
}
