use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::api::per_tenant;
use crate::error::{AppError, TenantError};
use crate::models::tenant::Tenant;
use crate::services::worksheet::ResolvedWorksheet;
use crate::AppState;

const TEST_MARKER: &str = "TEST";
const RECENT_ROWS: usize = 5;

pub fn routes() -> Router<AppState> {
    let router = per_tenant(Router::new(), "/test", get(test_connection));
    let router = per_tenant(router, "/sheet-info", get(sheet_info));
    per_tenant(router, "/clear-test-data", post(clear_test_data))
}

#[derive(Debug, Serialize)]
pub struct ConnectionInfo {
    pub spreadsheet_title: String,
    pub sheet_name: String,
    pub row_count: u32,
    pub col_count: u32,
    pub last_row_with_data: usize,
    pub data_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TestConnectionResponse {
    pub success: bool,
    pub message: String,
    pub sheet_info: ConnectionInfo,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct SheetInfo {
    pub spreadsheet_title: String,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub total_rows: usize,
    pub data_rows: usize,
    pub columns: usize,
    pub header: Vec<String>,
    pub last_5_rows: Vec<Vec<String>>,
    pub data_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SheetInfoResponse {
    pub success: bool,
    pub sheet_info: SheetInfo,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ClearTestDataResponse {
    pub success: bool,
    pub message: String,
    pub rows_deleted: usize,
    pub data_type: &'static str,
    pub timestamp: String,
}

async fn test_connection(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Json<TestConnectionResponse>, TenantError> {
    let ResolvedWorksheet { client, worksheet } = state
        .sheets
        .resolve(tenant)
        .await
        .map_err(|e| AppError::from(e).for_tenant(tenant))?;
    let values = client
        .get_all_values(&worksheet)
        .await
        .map_err(|e| AppError::from(e).for_tenant(tenant))?;

    info!("✅ {} Google Sheets connection test successful", tenant);

    Ok(Json(TestConnectionResponse {
        success: true,
        message: format!("{} Google Sheets connection successful", tenant),
        sheet_info: ConnectionInfo {
            spreadsheet_title: worksheet.spreadsheet_title,
            sheet_name: worksheet.title,
            row_count: worksheet.row_count,
            col_count: worksheet.col_count,
            last_row_with_data: values.len(),
            data_type: tenant.label(),
        },
        timestamp: Utc::now().to_rfc3339(),
    }))
}

async fn sheet_info(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Json<SheetInfoResponse>, TenantError> {
    let ResolvedWorksheet { client, worksheet } = state
        .sheets
        .resolve(tenant)
        .await
        .map_err(|e| AppError::from(e).for_tenant(tenant))?;
    let mut values = client
        .get_all_values(&worksheet)
        .await
        .map_err(|e| AppError::from(e).for_tenant(tenant))?;

    let total_rows = values.len();
    let data_rows = if values.is_empty() {
        Vec::new()
    } else {
        values.split_off(1)
    };
    let header = values.into_iter().next().unwrap_or_default();
    let last_5_rows = data_rows[data_rows.len().saturating_sub(RECENT_ROWS)..].to_vec();

    Ok(Json(SheetInfoResponse {
        success: true,
        sheet_info: SheetInfo {
            spreadsheet_title: worksheet.spreadsheet_title,
            spreadsheet_id: worksheet.spreadsheet_id,
            sheet_name: worksheet.title,
            total_rows,
            data_rows: data_rows.len(),
            columns: header.len(),
            header,
            last_5_rows,
            data_type: tenant.label(),
        },
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// 1-based indices of rows with any cell containing the test marker,
/// highest first so earlier deletions never shift later targets
pub fn test_rows_descending(values: &[Vec<String>]) -> Vec<u32> {
    values
        .iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|cell| cell.contains(TEST_MARKER)))
        .map(|(i, _)| i as u32 + 1)
        .rev()
        .collect()
}

async fn clear_test_data(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Json<ClearTestDataResponse>, TenantError> {
    let _guard = state.sheets.lock_writes(tenant).await;

    let ResolvedWorksheet { client, worksheet } = state
        .sheets
        .resolve(tenant)
        .await
        .map_err(|e| AppError::from(e).for_tenant(tenant))?;
    let values = client
        .get_all_values(&worksheet)
        .await
        .map_err(|e| AppError::from(e).for_tenant(tenant))?;

    let rows_to_delete = test_rows_descending(&values);
    if rows_to_delete.is_empty() {
        return Ok(Json(ClearTestDataResponse {
            success: true,
            message: format!("No test data found to clear in {} sheet", tenant),
            rows_deleted: 0,
            data_type: tenant.label(),
            timestamp: Utc::now().to_rfc3339(),
        }));
    }

    client
        .delete_rows(&worksheet, &rows_to_delete)
        .await
        .map_err(|e| AppError::from(e).for_tenant(tenant))?;

    info!("✅ Deleted {} test rows from {} sheet", rows_to_delete.len(), tenant);

    Ok(Json(ClearTestDataResponse {
        success: true,
        message: format!("Cleared {} test rows from {} sheet", rows_to_delete.len(), tenant),
        rows_deleted: rows_to_delete.len(),
        data_type: tenant.label(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::api::build_router;
    use crate::config::tests::test_settings;
    use crate::services::worksheet::fake::FakeConnector;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    async fn call(connector: &FakeConnector, method: Method, uri: &str) -> (StatusCode, Value) {
        let state = AppState::new(test_settings(), Arc::new(connector.clone()));
        let response = build_router(state, false)
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn finds_marker_rows_highest_first() {
        let values = vec![
            row(&["", "BOL", "Carrier"]),
            row(&["", "TEST-1", "ACME"]),
            row(&["", "2", "Swift"]),
            row(&["", "3", "xTESTx"]),
            row(&["", "test", "lowercase"]),
        ];
        assert_eq!(test_rows_descending(&values), vec![4, 2]);
    }

    #[tokio::test]
    async fn clears_test_rows_and_keeps_order() {
        let connector = FakeConnector::new().with_sheet(
            "BOL Log",
            vec![
                row(&["", "BOL", "Carrier"]),
                row(&["", "TEST", "ACME"]),
                row(&["", "1", "Swift"]),
                row(&["", "2", "TEST carrier"]),
                row(&["", "3", "Knight"]),
                row(&["", "TEST", "TEST"]),
            ],
        );

        let (status, body) = call(&connector, Method::POST, "/clear-test-data").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows_deleted"], 3);
        assert_eq!(body["data_type"], "ALLURA");

        let sheets = connector.sheets.lock().unwrap();
        let state = &sheets["BOL Log"];
        assert_eq!(state.deletions, vec![6, 4, 2]);
        assert_eq!(
            state.rows,
            vec![
                row(&["", "BOL", "Carrier"]),
                row(&["", "1", "Swift"]),
                row(&["", "3", "Knight"]),
            ]
        );
    }

    #[tokio::test]
    async fn clear_without_matches_deletes_nothing() {
        let connector = FakeConnector::new().with_sheet("IHL Log", vec![row(&["BOL"]), row(&["1"])]);
        let (status, body) = call(&connector, Method::POST, "/clear-test-data-ihl").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows_deleted"], 0);
        assert!(connector.sheets.lock().unwrap()["IHL Log"].deletions.is_empty());
    }

    #[tokio::test]
    async fn sheet_info_reports_last_five_rows() {
        let mut rows = vec![row(&["BOL", "Carrier"])];
        rows.extend((1..=7).map(|i| row(&[i.to_string().as_str(), "ACME"])));
        let connector = FakeConnector::new().with_sheet("BOL Log", rows);

        let (status, body) = call(&connector, Method::GET, "/sheet-info").await;
        assert_eq!(status, StatusCode::OK);
        let info = &body["sheet_info"];
        assert_eq!(info["total_rows"], 8);
        assert_eq!(info["data_rows"], 7);
        assert_eq!(info["columns"], 2);
        assert_eq!(info["header"], serde_json::json!(["BOL", "Carrier"]));
        assert_eq!(info["last_5_rows"].as_array().unwrap().len(), 5);
        assert_eq!(info["last_5_rows"][0][0], "3");
        assert_eq!(info["spreadsheet_id"], "allura-sheet-id");
    }

    #[tokio::test]
    async fn sheet_info_on_empty_sheet() {
        let connector = FakeConnector::new().with_sheet("IHL Log", vec![]);
        let (status, body) = call(&connector, Method::GET, "/sheet-info-ihl").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sheet_info"]["total_rows"], 0);
        assert_eq!(body["sheet_info"]["header"], serde_json::json!([]));
        assert_eq!(body["sheet_info"]["data_type"], "IHL");
    }

    #[tokio::test]
    async fn connection_test_reports_sheet() {
        let connector = FakeConnector::new().with_sheet("IHL Log", vec![row(&["BOL"]), row(&["1"])]);
        let (status, body) = call(&connector, Method::GET, "/test-ihl").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["sheet_info"]["sheet_name"], "IHL Log");
        assert_eq!(body["sheet_info"]["last_row_with_data"], 2);
        assert_eq!(body["sheet_info"]["data_type"], "IHL");
    }

    #[tokio::test]
    async fn connection_test_failure_is_server_error() {
        let connector = FakeConnector::new();
        let (status, body) = call(&connector, Method::GET, "/test").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["data_type"], "ALLURA");
        assert_eq!(body["error"], "Worksheet not found: BOL Log");
    }
}
