//! Authentication module
//!
//! Supports: service account keys, authorized-user refresh tokens, the
//! instance metadata server, and the anonymous emulator.
//!
//! `resolve_credentials` picks credentials from the configured source;
//! the `Authenticator` turns them into cached bearer tokens.

mod authenticator;
mod credentials;
mod types;

pub use authenticator::Authenticator;
pub use credentials::{
    normalize_private_key, parse_credentials_json, resolve_credentials,
    APPLICATION_CREDENTIALS_ENV, METADATA_HOST_ENV,
};
pub use types::{
    AuthorizedUser, CachedToken, CredentialSource, Credentials, ServiceAccountKey,
    CLOUD_PLATFORM_SCOPE, DATASTORE_SCOPE, DEFAULT_METADATA_HOST, DEFAULT_TOKEN_URI,
};
