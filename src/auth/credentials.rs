//! Credential resolution
//!
//! Credentials arrive as a file path, inline JSON or base64 JSON (first one
//! set wins), else from the environment.

use super::types::{
    AuthorizedUser, CredentialSource, Credentials, ServiceAccountKey, DEFAULT_METADATA_HOST,
};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::types::{JsonValue, OptionStringExt};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::EncodingKey;
use tracing::debug;

/// Path to an application-default credentials file
pub const APPLICATION_CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Metadata server host override
pub const METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";

impl CredentialSource {
    /// Pick the credential source a config asks for
    pub fn from_config(config: &TapConfig) -> Self {
        if config.resolved_emulator_host().is_some() {
            return CredentialSource::Emulator;
        }
        if let Some(path) = config.credentials_path.clone().none_if_empty() {
            return CredentialSource::Path(path);
        }
        if let Some(json) = config.credentials_json.clone().none_if_empty() {
            return CredentialSource::Json(json);
        }
        if let Some(encoded) = config.credentials_base64.clone().none_if_empty() {
            return CredentialSource::Base64(encoded);
        }
        CredentialSource::Ambient
    }
}

/// Turn a credential source into usable credentials
pub fn resolve_credentials(source: &CredentialSource) -> Result<Credentials> {
    match source {
        CredentialSource::Path(path) => load_credentials_file(path),
        CredentialSource::Json(json) => parse_credentials_json(json),
        CredentialSource::Base64(encoded) => {
            let bytes = STANDARD
                .decode(encoded.trim())
                .map_err(|e| Error::credentials(format!("credentials_base64 is not base64: {e}")))?;
            let json = String::from_utf8(bytes).map_err(|e| {
                Error::credentials(format!("credentials_base64 is not UTF-8 JSON: {e}"))
            })?;
            parse_credentials_json(&json)
        }
        CredentialSource::Ambient => match std::env::var(APPLICATION_CREDENTIALS_ENV) {
            Ok(path) if !path.is_empty() => {
                debug!("Using credentials from {APPLICATION_CREDENTIALS_ENV}");
                load_credentials_file(&path)
            }
            _ => {
                let host = std::env::var(METADATA_HOST_ENV)
                    .ok()
                    .none_if_empty()
                    .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string());
                debug!("Using metadata server credentials at {host}");
                Ok(Credentials::MetadataServer { host })
            }
        },
        CredentialSource::Emulator => Ok(Credentials::Anonymous),
    }
}

/// Parse a credentials JSON document
pub fn parse_credentials_json(text: &str) -> Result<Credentials> {
    let mut document: JsonValue = serde_json::from_str(text)
        .map_err(|e| Error::credentials(format!("credentials are not valid JSON: {e}")))?;
    normalize_private_key(&mut document);

    let kind = document
        .get("type")
        .and_then(JsonValue::as_str)
        .unwrap_or("service_account")
        .to_string();

    match kind.as_str() {
        "service_account" => {
            let key: ServiceAccountKey = serde_json::from_value(document)
                .map_err(|e| Error::credentials(format!("invalid service account key: {e}")))?;
            EncodingKey::from_rsa_pem(key.private_key.as_bytes())
                .map_err(|e| Error::credentials(format!("unusable private key: {e}")))?;
            Ok(Credentials::ServiceAccount(key))
        }
        "authorized_user" => {
            let user: AuthorizedUser = serde_json::from_value(document)
                .map_err(|e| Error::credentials(format!("invalid authorized user: {e}")))?;
            Ok(Credentials::AuthorizedUser(user))
        }
        other => Err(Error::credentials(format!(
            "unsupported credential type '{other}'"
        ))),
    }
}

/// Replace literal `\n` escape pairs in `private_key` with real newlines.
///
/// Keys pasted through environment variables or CI secrets often arrive
/// with the escapes left in.
pub fn normalize_private_key(document: &mut JsonValue) {
    if let Some(JsonValue::String(key)) = document.get_mut("private_key") {
        if key.contains("\\n") {
            *key = key.replace("\\n", "\n");
        }
    }
}

fn load_credentials_file(path: &str) -> Result<Credentials> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::credentials(format!("cannot read credentials file '{path}': {e}")))?;
    parse_credentials_json(&text)
}
