use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod error;
mod models;
mod services;
mod utils;

use config::Settings;
use models::tenant::Tenant;
use services::sheets_client::SheetsConnector;
use services::{GoogleConnector, WorksheetResolver};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub sheets: WorksheetResolver,
}

impl AppState {
    pub fn new(settings: Settings, connector: Arc<dyn SheetsConnector>) -> Self {
        let sheets = WorksheetResolver::new(connector, &settings);
        Self {
            settings: Arc::new(settings),
            sheets,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let has_env_file = dotenvy::dotenv().is_ok();
    let settings = Settings::from_env();

    // Fall back to info so a configuration failure is still logged
    let log_filter = settings
        .as_ref()
        .map(Settings::log_filter)
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or(log_filter),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            error!("❌ Configuration error: {}", e);
            return Err(e.into());
        }
    };

    info!("✅ Configuration loaded successfully");
    for tenant in [Tenant::Allura, Tenant::Ihl] {
        let target = settings.tenant(tenant);
        info!(
            "📊 {} Target Sheet: {} - '{}'",
            tenant.display_name(),
            target.spreadsheet_id,
            target.sheet_name
        );
    }
    if has_env_file {
        info!("📁 Using .env file for configuration (development mode)");
    } else {
        info!("🌐 Using system environment variables (production mode)");
    }

    let addr = format!("{}:{}", settings.host, settings.port);
    let debug_mode = settings.debug;

    let connector = GoogleConnector::new(reqwest::Client::new(), settings.credentials.clone());
    let state = AppState::new(settings, Arc::new(connector));
    let app = api::build_router(state, debug_mode);

    info!("🚀 Sheets bridge v{}", env!("CARGO_PKG_VERSION"));
    info!("📡 Starting server on {}", addr);
    info!("📊 Debug mode: {}", debug_mode);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
