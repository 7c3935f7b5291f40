use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::GoogleCredentials;
use crate::services::sheets_client::{GoogleSheetsClient, SheetsClient, SheetsConnector, SheetsError};

pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const CERTS_URL: &str = "https://www.googleapis.com/oauth2/v1/certs";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Service-account key in the shape Google issues it as JSON
#[derive(Debug, Clone, Serialize)]
pub struct ServiceAccountDescriptor {
    #[serde(rename = "type")]
    pub account_type: &'static str,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: &'static str,
    pub token_uri: &'static str,
    pub auth_provider_x509_cert_url: &'static str,
    pub client_x509_cert_url: String,
}

impl ServiceAccountDescriptor {
    pub fn from_credentials(creds: &GoogleCredentials) -> Self {
        Self {
            account_type: "service_account",
            project_id: creds.project_id.clone(),
            private_key_id: creds.private_key_id.clone(),
            private_key: normalize_private_key(&creds.private_key),
            client_email: creds.client_email.clone(),
            client_id: creds.client_id.clone(),
            auth_uri: AUTH_URI,
            token_uri: TOKEN_URI,
            auth_provider_x509_cert_url: CERTS_URL,
            client_x509_cert_url: format!("{}/{}", CERTS_URL, creds.client_email.replace('@', "%40")),
        }
    }
}

/// Keys pasted into env files usually carry literal `\n` sequences
fn normalize_private_key(key: &str) -> String {
    key.replace("\\n", "\n")
}

#[derive(Debug, Serialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AssertionClaims {
    pub fn new(descriptor: &ServiceAccountDescriptor, issued_at: i64) -> Self {
        Self {
            iss: descriptor.client_email.clone(),
            scope: SCOPES.join(" "),
            aud: descriptor.token_uri.to_string(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Sign the JWT bearer assertion for the token exchange
pub fn sign_assertion(descriptor: &ServiceAccountDescriptor) -> Result<String, SheetsError> {
    let key = EncodingKey::from_rsa_pem(descriptor.private_key.as_bytes())
        .map_err(|e| SheetsError::Auth(format!("invalid private key: {}", e)))?;

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(descriptor.private_key_id.clone());

    let claims = AssertionClaims::new(descriptor, Utc::now().timestamp());
    jsonwebtoken::encode(&header, &claims, &key).map_err(|e| SheetsError::Auth(e.to_string()))
}

/// Exchange a signed assertion for an OAuth access token
pub async fn fetch_access_token(
    http: &reqwest::Client,
    descriptor: &ServiceAccountDescriptor,
) -> Result<String, SheetsError> {
    let assertion = sign_assertion(descriptor)?;

    let resp = http
        .post(descriptor.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_else(|_| "Unknown error".into());
        let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(e) => match e.error_description {
                Some(desc) => format!("{}: {}", e.error, desc),
                None => e.error,
            },
            Err(_) => body,
        };
        return Err(SheetsError::Auth(format!("token endpoint returned {}: {}", status, message)));
    }

    let token: TokenResponse = resp.json().await?;
    Ok(token.access_token)
}

/// Authorizes a fresh Sheets client from the configured service account.
///
/// Every connect signs a new assertion and exchanges it for a token; no
/// token is cached between requests. That costs one extra round trip per
/// request compared with a caching authenticator such as yup-oauth2, in
/// exchange for staying on reqwest and jsonwebtoken only.
pub struct GoogleConnector {
    http: reqwest::Client,
    credentials: GoogleCredentials,
}

impl GoogleConnector {
    pub fn new(http: reqwest::Client, credentials: GoogleCredentials) -> Self {
        Self { http, credentials }
    }
}

#[async_trait]
impl SheetsConnector for GoogleConnector {
    async fn connect(&self) -> Result<Box<dyn SheetsClient>, SheetsError> {
        let descriptor = ServiceAccountDescriptor::from_credentials(&self.credentials);
        match fetch_access_token(&self.http, &descriptor).await {
            Ok(token) => {
                info!("✅ Google Sheets client initialized successfully");
                Ok(Box::new(GoogleSheetsClient::new(self.http.clone(), token)))
            }
            Err(e) => {
                error!("❌ Failed to initialize Google Sheets client: {}", e);
                Err(e)
            }
        }
    }
}
