//! Credential types

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Scope granting document-store data access
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Scope granting cloud-platform-wide access
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Google OAuth2 token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Default metadata server host on GCE / Cloud Run
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

/// Where credentials come from, in precedence order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Path to a credentials JSON file
    Path(String),
    /// Inline credentials JSON
    Json(String),
    /// Base64-encoded credentials JSON
    Base64(String),
    /// Application default credentials
    Ambient,
    /// Local emulator, no credentials at all
    Emulator,
}

/// Service account key file contents
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// `gcloud auth application-default login` credentials
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Resolved credentials, ready to mint access tokens
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Signed JWT assertion exchanged for an access token
    ServiceAccount(ServiceAccountKey),
    /// OAuth2 refresh-token grant
    AuthorizedUser(AuthorizedUser),
    /// Token served by the instance metadata server
    MetadataServer { host: String },
    /// Emulator owner token
    Anonymous,
}

impl Credentials {
    /// Short name, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::ServiceAccount(_) => "service_account",
            Credentials::AuthorizedUser(_) => "authorized_user",
            Credentials::MetadataServer { .. } => "metadata_server",
            Credentials::Anonymous => "anonymous",
        }
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + chrono::Duration::seconds(30) >= expires_at,
            None => false,
        }
    }
}
