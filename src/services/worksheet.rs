use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info};

use crate::config::Settings;
use crate::models::sheet::Worksheet;
use crate::models::tenant::{Tenant, TenantSheet};
use crate::services::sheets_client::{SheetsClient, SheetsConnector, SheetsError};

/// Live client plus the tenant's worksheet
pub struct ResolvedWorksheet {
    pub client: Box<dyn SheetsClient>,
    pub worksheet: Worksheet,
}

/// Maps a tenant to its configured worksheet and opens it on demand
#[derive(Clone)]
pub struct WorksheetResolver {
    connector: Arc<dyn SheetsConnector>,
    tenants: Arc<HashMap<Tenant, TenantSheet>>,
    write_locks: Arc<HashMap<Tenant, Mutex<()>>>,
}

impl WorksheetResolver {
    pub fn new(connector: Arc<dyn SheetsConnector>, settings: &Settings) -> Self {
        let write_locks = settings
            .tenants
            .keys()
            .map(|tenant| (*tenant, Mutex::new(())))
            .collect();
        Self {
            connector,
            tenants: Arc::new(settings.tenants.clone()),
            write_locks: Arc::new(write_locks),
        }
    }

    pub async fn resolve(&self, tenant: Tenant) -> Result<ResolvedWorksheet, SheetsError> {
        let target = self.tenants.get(&tenant).ok_or_else(|| {
            SheetsError::WorksheetNotFound(format!("no sheet configured for {}", tenant))
        })?;

        let opened = async {
            let client = self.connector.connect().await?;
            let worksheet = client
                .open_worksheet(&target.spreadsheet_id, &target.sheet_name)
                .await?;
            Ok::<_, SheetsError>(ResolvedWorksheet { client, worksheet })
        }
        .await;

        match &opened {
            Ok(resolved) => info!(
                "📊 Connected to {} sheet: {}",
                tenant.display_name(),
                resolved.worksheet.title
            ),
            Err(e) => error!("❌ Failed to get {} worksheet: {}", tenant.label(), e),
        }
        opened
    }

    /// Serializes read-then-write sequences against one tenant's sheet.
    /// Only guards requests handled by this process.
    pub async fn lock_writes(&self, tenant: Tenant) -> Option<MutexGuard<'_, ()>> {
        Some(self.write_locks.get(&tenant)?.lock().await)
    }
}
