use std::collections::HashMap;

use thiserror::Error;

use crate::models::tenant::{Tenant, TenantSheet};

const REQUIRED_VARS: [&str; 9] = [
    "GOOGLE_PROJECT_ID",
    "GOOGLE_PRIVATE_KEY_ID",
    "GOOGLE_PRIVATE_KEY",
    "GOOGLE_CLIENT_EMAIL",
    "GOOGLE_CLIENT_ID",
    "SPREADSHEET_ID",
    "SHEET_NAME",
    "IHL_SPREADSHEET_ID",
    "IHL_SHEET_NAME",
];

const DEFAULT_PORT: u16 = 5550;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<String>),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Service-account fields, exactly as provided by the environment
#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
}

/// Application settings loaded from environment variables
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub log_level: String,
    pub credentials: GoogleCredentials,
    pub tenants: HashMap<Tenant, TenantSheet>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let missing: Vec<String> = REQUIRED_VARS
            .into_iter()
            .filter(|&name| get(name).is_none())
            .map(String::from)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing));
        }

        // Checked above, so every required lookup yields a value
        let required = |name: &str| get(name).unwrap_or_default();

        // Cloud platforms (Render etc.) inject PORT; fall back to FLASK_PORT
        let port = match get("PORT").or_else(|| get("FLASK_PORT")) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { name: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };

        let mut tenants = HashMap::new();
        tenants.insert(
            Tenant::Allura,
            TenantSheet {
                spreadsheet_id: required("SPREADSHEET_ID"),
                sheet_name: required("SHEET_NAME"),
            },
        );
        tenants.insert(
            Tenant::Ihl,
            TenantSheet {
                spreadsheet_id: required("IHL_SPREADSHEET_ID"),
                sheet_name: required("IHL_SHEET_NAME"),
            },
        );

        Ok(Self {
            host: get("FLASK_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            debug: get("FLASK_DEBUG")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(true),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "INFO".into()),
            credentials: GoogleCredentials {
                project_id: required("GOOGLE_PROJECT_ID"),
                private_key_id: required("GOOGLE_PRIVATE_KEY_ID"),
                private_key: required("GOOGLE_PRIVATE_KEY"),
                client_email: required("GOOGLE_CLIENT_EMAIL"),
                client_id: required("GOOGLE_CLIENT_ID"),
            },
            tenants,
        })
    }

    /// Tracing filter for LOG_LEVEL, accepting Python-style level names
    pub fn log_filter(&self) -> String {
        match self.log_level.to_lowercase().as_str() {
            "warning" => "warn".into(),
            "critical" | "fatal" => "error".into(),
            other => other.to_string(),
        }
    }

    pub fn tenant(&self, tenant: Tenant) -> &TenantSheet {
        // Both tenants are inserted by from_lookup
        &self.tenants[&tenant]
    }
}
