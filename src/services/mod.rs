pub mod csv_parser;
pub mod google_auth;
pub mod sheets_client;
pub mod worksheet;

pub use google_auth::GoogleConnector;
pub use worksheet::WorksheetResolver;
