//! Error types for firestore-tap
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for firestore-tap
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Credential Errors
    // ============================================================================
    #[error("Invalid credentials: {message}")]
    Credentials { message: String },

    #[error("Token exchange failed: {message}")]
    TokenExchange { message: String },

    #[error("JWT generation failed: {message}")]
    JwtGeneration { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Store Errors
    // ============================================================================
    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Failed to decode store response: {message}")]
    Decode { message: String },

    /// Fatal error raised while extracting one collection
    #[error("Collection '{collection}': {source}")]
    Collection {
        collection: String,
        #[source]
        source: Box<Error>,
    },

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    #[error("Checkpoint failed: {message}")]
    Checkpoint { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a credentials error
    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a query error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Attach the collection name to a fatal extraction error
    pub fn in_collection(self, collection: impl Into<String>) -> Self {
        match self {
            // Don't double-wrap
            Self::Collection { .. } => self,
            other => Self::Collection {
                collection: collection.into(),
                source: Box::new(other),
            },
        }
    }

    /// Check if this error came from talking to the store or token endpoint
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Http(_) | Error::HttpStatus { .. } | Error::Timeout { .. } => true,
            Error::Collection { source, .. } => source.is_transport(),
            _ => false,
        }
    }
}

/// Result type alias for firestore-tap
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("project_id");
        assert_eq!(err.to_string(), "Missing required config field: project_id");

        let err = Error::http_status(403, "PERMISSION_DENIED");
        assert_eq!(err.to_string(), "HTTP 403: PERMISSION_DENIED");
    }

    #[test]
    fn test_in_collection_names_collection_and_cause() {
        let err = Error::query("index missing").in_collection("orders");
        assert_eq!(
            err.to_string(),
            "Collection 'orders': Query failed: index missing"
        );

        // Wrapping twice keeps the innermost collection
        let err = err.in_collection("users");
        assert!(err.to_string().starts_with("Collection 'orders'"));
    }

    #[test]
    fn test_is_transport() {
        assert!(Error::http_status(503, "").is_transport());
        assert!(Error::Timeout { timeout_ms: 1000 }.is_transport());
        assert!(Error::http_status(500, "")
            .in_collection("users")
            .is_transport());
        assert!(!Error::config("test").is_transport());
        assert!(!Error::query("bad").is_transport());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
