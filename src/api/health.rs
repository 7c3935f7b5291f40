use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::models::tenant::{Tenant, TenantSheet};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub allura_config: TenantSheet,
    pub ihl_config: TenantSheet,
    pub timestamp: String,
}

/// Liveness only; never touches the Sheets API
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "Google Sheets BOL Processor",
        allura_config: state.settings.tenant(Tenant::Allura).clone(),
        ihl_config: state.settings.tenant(Tenant::Ihl).clone(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
