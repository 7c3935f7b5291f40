use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use thiserror::Error;

use crate::models::tenant::Tenant;
use crate::services::sheets_client::SheetsError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Sheets(#[from] SheetsError),
    #[error("Upload failed: {0}")]
    UploadFailed(SheetsError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Sheets(_) | AppError::UploadFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn for_tenant(self, tenant: Tenant) -> TenantError {
        TenantError {
            tenant,
            error: self,
            tenant_key: "data_type",
        }
    }
}

/// An error tied to the tenant whose request produced it
#[derive(Debug)]
pub struct TenantError {
    pub tenant: Tenant,
    pub error: AppError,
    tenant_key: &'static str,
}

impl TenantError {
    /// Upload responses are camelCase, so the tenant tag goes under `dataType`
    pub fn camel_case(mut self) -> Self {
        self.tenant_key = "dataType";
        self
    }
}

impl std::fmt::Display for TenantError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.tenant, self.error)
    }
}

impl IntoResponse for TenantError {
    fn into_response(self) -> Response {
        let status = self.error.status();
        if status.is_server_error() {
            tracing::error!("❌ {} request failed: {}", self.tenant, self.error);
        } else {
            tracing::warn!("❌ {} validation error: {}", self.tenant, self.error);
        }

        let mut body = serde_json::json!({
            "success": false,
            "error": self.error.to_string(),
            "timestamp": Utc::now().to_rfc3339(),
        });
        body[self.tenant_key] = serde_json::json!(self.tenant.label());

        (status, Json(body)).into_response()
    }
}

/// Request body problems detected before a tenant operation starts
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("No CSV content provided")]
    MissingContent,
    #[error("Empty CSV content")]
    EmptyContent,
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        tracing::warn!("❌ Rejected upload request: {}", self);
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "success": false, "error": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Sheets(SheetsError::WorksheetNotFound("Log".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upload_failure_is_prefixed() {
        let err = AppError::UploadFailed(SheetsError::SpreadsheetNotFound("abc".into()));
        assert!(err.to_string().starts_with("Upload failed: "));
    }
}
