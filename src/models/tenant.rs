use serde::Serialize;

/// One of the two fixed upload targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tenant {
    Allura,
    Ihl,
}

impl Tenant {
    /// Resolve a tenant tag. Anything other than "ihl" falls back to Allura.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "ihl" => Tenant::Ihl,
            _ => Tenant::Allura,
        }
    }

    /// Upper-case label used in logs and responses
    pub fn label(&self) -> &'static str {
        match self {
            Tenant::Allura => "ALLURA",
            Tenant::Ihl => "IHL",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tenant::Allura => "Allura",
            Tenant::Ihl => "IHL",
        }
    }
}

impl std::fmt::Display for Tenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Spreadsheet id + sheet name a tenant writes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantSheet {
    pub spreadsheet_id: String,
    pub sheet_name: String,
}
