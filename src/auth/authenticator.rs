//! Authenticator implementation
//!
//! Mints OAuth2 access tokens from resolved credentials and applies them to
//! requests, caching each token until shortly before it expires.

use super::types::{
    AuthorizedUser, CachedToken, Credentials, ServiceAccountKey, CLOUD_PLATFORM_SCOPE,
    DATASTORE_SCOPE,
};
use crate::error::{Error, Result};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Lifetime requested for service account assertions
const ASSERTION_LIFETIME_SECONDS: i64 = 3600;

/// Token the emulator accepts as an all-powerful caller
const EMULATOR_TOKEN: &str = "owner";

/// Authenticator applies bearer tokens to HTTP requests
pub struct Authenticator {
    credentials: Credentials,
    scopes: Vec<String>,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    http_client: Client,
}

impl Authenticator {
    /// Create an authenticator with its own HTTP client
    pub fn new(credentials: Credentials) -> Self {
        Self::with_client(credentials, Client::new())
    }

    /// Create an authenticator sharing an HTTP client
    pub fn with_client(credentials: Credentials, http_client: Client) -> Self {
        Self {
            credentials,
            scopes: vec![DATASTORE_SCOPE.to_string(), CLOUD_PLATFORM_SCOPE.to_string()],
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Scopes requested for every token
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// The credentials this authenticator mints tokens from
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Apply authentication to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.access_token().await?;
        Ok(req.bearer_auth(token))
    }

    /// Get a valid access token, refreshing if necessary
    pub async fn access_token(&self) -> Result<String> {
        if matches!(self.credentials, Credentials::Anonymous) {
            return Ok(EMULATOR_TOKEN.to_string());
        }

        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Another task may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let new_token = self.fetch_new_token().await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);

        Ok(token_str)
    }

    /// Drop the cached token, forcing a refresh on next use
    pub async fn clear_cache(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }

    async fn fetch_new_token(&self) -> Result<CachedToken> {
        debug!("Fetching access token ({})", self.credentials.kind());
        match &self.credentials {
            Credentials::ServiceAccount(key) => self.exchange_service_account(key).await,
            Credentials::AuthorizedUser(user) => self.refresh_authorized_user(user).await,
            Credentials::MetadataServer { host } => self.fetch_metadata_token(host).await,
            Credentials::Anonymous => Ok(CachedToken::new(EMULATOR_TOKEN.to_string(), None)),
        }
    }

    /// Sign a JWT assertion and exchange it at the token endpoint
    async fn exchange_service_account(&self, key: &ServiceAccountKey) -> Result<CachedToken> {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            iss: key.client_email.clone(),
            scope: self.scopes.join(" "),
            aud: key.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECONDS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&key.private_key_id);

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            Error::JwtGeneration {
                message: format!("Invalid private key: {e}"),
            }
        })?;

        let jwt = encode(&header, &claims, &encoding_key).map_err(|e| Error::JwtGeneration {
            message: format!("Failed to encode JWT: {e}"),
        })?;

        let form = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", jwt.as_str()),
        ];
        let response = self
            .http_client
            .post(&key.token_uri)
            .form(&form)
            .send()
            .await
            .map_err(Error::Http)?;

        read_token_response(response, "JWT token exchange").await
    }

    /// OAuth2 refresh-token grant
    async fn refresh_authorized_user(&self, user: &AuthorizedUser) -> Result<CachedToken> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", user.client_id.as_str()),
            ("client_secret", user.client_secret.as_str()),
            ("refresh_token", user.refresh_token.as_str()),
        ];
        let response = self
            .http_client
            .post(&user.token_uri)
            .form(&form)
            .send()
            .await
            .map_err(Error::Http)?;

        read_token_response(response, "Refresh token request").await
    }

    /// Ask the instance metadata server for the default account's token
    async fn fetch_metadata_token(&self, host: &str) -> Result<CachedToken> {
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("http://{host}")
        };
        let url = format!("{base}/computeMetadata/v1/instance/service-accounts/default/token");

        let response = self
            .http_client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .query(&[("scopes", self.scopes.join(","))])
            .send()
            .await
            .map_err(|e| {
                Error::credentials(format!(
                    "no credentials configured and the metadata server is unreachable: {e}"
                ))
            })?;

        read_token_response(response, "Metadata server token request").await
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("credentials", &self.credentials.kind())
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

async fn read_token_response(response: reqwest::Response, what: &str) -> Result<CachedToken> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::TokenExchange {
            message: format!("{what} failed with status {status}: {body}"),
        });
    }

    let token_response: TokenResponse = response.json().await.map_err(Error::Http)?;
    Ok(token_response.into_cached_token())
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_cached_token(self) -> CachedToken {
        match self.expires_in {
            Some(secs) => CachedToken::expires_in(self.access_token, secs),
            None => CachedToken::new(self.access_token, None),
        }
    }
}

/// Service account assertion claims
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}
