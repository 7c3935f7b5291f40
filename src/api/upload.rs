use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::api::per_tenant;
use crate::error::{AppError, RequestError};
use crate::models::tenant::Tenant;
use crate::services::csv_parser::parse_csv;
use crate::services::worksheet::ResolvedWorksheet;
use crate::utils::columns::a1_range;
use crate::AppState;

/// Uploaded rows land one column right of A
const DATA_START_COLUMN: u32 = 2;

pub fn routes() -> Router<AppState> {
    per_tenant(Router::new(), "/upload-csv", post(upload_csv))
}

#[derive(Debug, Deserialize)]
pub struct UploadCsvRequest {
    /// Outer `None` when the key is absent, inner `None` when it is null
    #[serde(rename = "csvContent", default, deserialize_with = "present")]
    pub csv_content: Option<Option<String>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCsvResponse {
    pub success: bool,
    pub message: String,
    pub rows_added: u32,
    pub start_row: u32,
    pub end_row: u32,
    pub sheet_name: String,
    pub spreadsheet_id: String,
    pub data_type: &'static str,
    pub timestamp: String,
}

async fn upload_csv(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    body: Result<Json<UploadCsvRequest>, JsonRejection>,
) -> Response {
    let csv_content = match csv_content(body) {
        Ok(content) => content,
        Err(e) => return e.into_response(),
    };

    info!(
        "📥 Received {} CSV upload request ({} characters)",
        tenant,
        csv_content.chars().count()
    );

    match append_rows(&state, tenant, &csv_content).await {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => e.for_tenant(tenant).camel_case().into_response(),
    }
}

fn csv_content(body: Result<Json<UploadCsvRequest>, JsonRejection>) -> Result<String, RequestError> {
    let Ok(Json(UploadCsvRequest { csv_content: Some(content) })) = body else {
        return Err(RequestError::MissingContent);
    };
    match content {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(RequestError::EmptyContent),
    }
}

async fn append_rows(state: &AppState, tenant: Tenant, csv_content: &str) -> Result<UploadCsvResponse, AppError> {
    // Header is dropped; the target sheet already has one
    let parsed = parse_csv(csv_content)?;
    if parsed.rows.is_empty() {
        return Err(AppError::Validation("No data rows to add".into()));
    }

    // Held until the write finishes so two uploads never pick the same start row
    let _guard = state.sheets.lock_writes(tenant).await;

    let ResolvedWorksheet { client, worksheet } = state
        .sheets
        .resolve(tenant)
        .await
        .map_err(AppError::UploadFailed)?;

    let existing = client
        .get_all_values(&worksheet)
        .await
        .map_err(AppError::UploadFailed)?;

    let rows_added = parsed.rows.len() as u32;
    let start_row = existing.len() as u32 + 1;
    let end_row = start_row + rows_added - 1;
    let max_columns = parsed.max_columns() as u32;
    let end_column = DATA_START_COLUMN + max_columns - 1;
    let range = a1_range(&worksheet.title, DATA_START_COLUMN, start_row, end_column, end_row);

    info!("📍 Adding {} rows starting at row {}", rows_added, start_row);
    info!(
        "📊 Writing to range: {} (for {} columns, shifted to start at B)",
        range, max_columns
    );

    client
        .update_range(&worksheet, &range, &parsed.rows)
        .await
        .map_err(AppError::UploadFailed)?;

    info!(
        "✅ Successfully added {} rows to {} Google Sheets",
        rows_added, tenant
    );

    Ok(UploadCsvResponse {
        success: true,
        message: format!("Successfully added {} rows to {} Google Sheets", rows_added, tenant),
        rows_added,
        start_row,
        end_row,
        sheet_name: worksheet.title,
        spreadsheet_id: worksheet.spreadsheet_id,
        data_type: tenant.label(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::api::build_router;
    use crate::config::tests::test_settings;
    use crate::services::worksheet::fake::FakeConnector;
    use crate::AppState;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn connector() -> FakeConnector {
        FakeConnector::new()
            .with_sheet("BOL Log", vec![row(&["", "BOL", "Carrier", "Weight"]), row(&["", "1", "ACME", "10"])])
            .with_sheet("IHL Log", vec![row(&["", "BOL", "Carrier"])])
    }

    async fn post_json(connector: &FakeConnector, uri: &str, body: Value) -> (StatusCode, Value) {
        let state = AppState::new(test_settings(), Arc::new(connector.clone()));
        let response = build_router(state, false)
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn appends_after_last_row_starting_at_column_b() {
        let connector = connector();
        let (status, body) = post_json(
            &connector,
            "/upload-csv",
            json!({ "csvContent": "BOL,Carrier,Weight\r\n2,Swift,20\r\n3,Knight\r\n" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["rowsAdded"], 2);
        assert_eq!(body["startRow"], 3);
        assert_eq!(body["endRow"], 4);
        assert_eq!(body["sheetName"], "BOL Log");
        assert_eq!(body["spreadsheetId"], "allura-sheet-id");
        assert_eq!(body["dataType"], "ALLURA");

        let sheets = connector.sheets.lock().unwrap();
        let state = &sheets["BOL Log"];
        assert_eq!(state.writes.len(), 1);
        assert_eq!(state.writes[0].0, "'BOL Log'!B3:D4");
        assert_eq!(state.writes[0].1, vec![row(&["2", "Swift", "20"]), row(&["3", "Knight"])]);
    }

    #[tokio::test]
    async fn widest_row_sets_end_column() {
        let connector = connector();
        let (status, _) = post_json(
            &connector,
            "/upload-csv-ihl",
            json!({ "csvContent": "a,b\n1\n1,2,3,4,5\n1,2" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let sheets = connector.sheets.lock().unwrap();
        assert_eq!(sheets["IHL Log"].writes[0].0, "'IHL Log'!B2:F4");
        assert!(sheets["BOL Log"].writes.is_empty());
    }

    #[tokio::test]
    async fn missing_content_is_bad_request() {
        let (status, body) = post_json(&connector(), "/upload-csv", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "No CSV content provided");
    }

    #[tokio::test]
    async fn blank_content_is_bad_request() {
        let (status, body) = post_json(&connector(), "/upload-csv", json!({ "csvContent": "  \n " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Empty CSV content");
    }

    #[tokio::test]
    async fn null_content_is_empty_not_missing() {
        let (status, body) = post_json(&connector(), "/upload-csv", json!({ "csvContent": null })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Empty CSV content");
    }

    #[tokio::test]
    async fn header_only_is_bad_request() {
        let (status, body) = post_json(&connector(), "/upload-csv-ihl", json!({ "csvContent": "BOL,Carrier" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["dataType"], "IHL");
        assert!(body["error"].as_str().unwrap().starts_with("Invalid CSV format"));
    }

    #[tokio::test]
    async fn remote_failure_is_server_error() {
        let mut connector = connector();
        connector.fail_auth = true;
        let (status, body) = post_json(&connector, "/upload-csv", json!({ "csvContent": "a\n1" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("Upload failed: "));
        assert_eq!(body["dataType"], "ALLURA");
    }

    #[tokio::test]
    async fn consecutive_uploads_do_not_overlap() {
        let connector = connector();
        let csv = json!({ "csvContent": "a,b\n1,2\n3,4" });
        post_json(&connector, "/upload-csv", csv.clone()).await;
        let (_, body) = post_json(&connector, "/upload-csv", csv).await;
        assert_eq!(body["startRow"], 5);
        assert_eq!(body["endRow"], 6);
    }
}
