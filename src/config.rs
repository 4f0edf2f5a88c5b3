//! Configuration types for the tap
//!
//! `TapConfig` is loaded from a JSON or YAML file (or an inline JSON
//! string) and validated before any extraction begins.

use crate::error::{Error, Result};
use crate::types::{OptionStringExt, PaginationStrategy, ReplicationKeyType, SyncMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Environment variable pointing at a local Firestore emulator
pub const EMULATOR_HOST_ENV: &str = "FIRESTORE_EMULATOR_HOST";

// ============================================================================
// Top-Level Tap Config
// ============================================================================

/// Complete tap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Cloud project holding the database
    #[serde(default)]
    pub project_id: String,

    /// Database within the project
    #[serde(default = "default_database_id")]
    pub database_id: String,

    /// Path to a credentials JSON file
    #[serde(default)]
    pub credentials_path: Option<String>,

    /// Inline credentials JSON
    #[serde(default)]
    pub credentials_json: Option<String>,

    /// Base64-encoded credentials JSON
    #[serde(default)]
    pub credentials_base64: Option<String>,

    /// `host:port` of a local emulator; bypasses credentials entirely
    #[serde(default)]
    pub emulator_host: Option<String>,

    /// REST API base URL override
    #[serde(default)]
    pub api_endpoint: Option<String>,

    /// Client-side request rate limit
    #[serde(default)]
    pub requests_per_second: Option<u32>,

    /// Per-request timeout
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Collections to extract, in order
    #[serde(default)]
    pub collections: Vec<CollectionSpec>,
}

fn default_database_id() -> String {
    "(default)".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

/// Public Firestore REST endpoint
pub const DEFAULT_API_ENDPOINT: &str = "https://firestore.googleapis.com/v1";

impl TapConfig {
    /// Load configuration from a JSON or YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from JSON or YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // YAML is a superset of JSON
        let config: TapConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Parse configuration from a JSON string
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: TapConfig = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Emulator host from the config, else from the environment
    pub fn resolved_emulator_host(&self) -> Option<String> {
        self.emulator_host
            .clone()
            .none_if_empty()
            .or_else(|| std::env::var(EMULATOR_HOST_ENV).ok().none_if_empty())
    }

    /// REST base URL for this config
    pub fn resolved_api_endpoint(&self) -> String {
        if let Some(endpoint) = self.api_endpoint.clone().none_if_empty() {
            return endpoint.trim_end_matches('/').to_string();
        }
        match self.resolved_emulator_host() {
            Some(host) => format!("http://{}/v1", host.trim_end_matches('/')),
            None => DEFAULT_API_ENDPOINT.to_string(),
        }
    }

    /// Find a collection by name
    pub fn collection(&self, name: &str) -> Option<&CollectionSpec> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Check the config before any extraction begins
    pub fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            return Err(Error::missing_field("project_id"));
        }
        if self.database_id.trim().is_empty() {
            return Err(Error::invalid_value("database_id", "must not be empty"));
        }
        if self.collections.is_empty() {
            return Err(Error::invalid_value(
                "collections",
                "at least one collection is required",
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::invalid_value("timeout_seconds", "must be positive"));
        }
        if self.requests_per_second == Some(0) {
            return Err(Error::invalid_value(
                "requests_per_second",
                "must be positive",
            ));
        }
        url::Url::parse(&self.resolved_api_endpoint())?;
        for collection in &self.collections {
            collection.validate()?;
        }
        Ok(())
    }
}

// ============================================================================
// Collection Spec
// ============================================================================

/// Configuration for one extraction unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSpec {
    /// Collection path, e.g. `users` or `users/u1/orders`
    #[serde(default)]
    pub name: String,

    /// Field used as a monotonic cursor
    #[serde(default)]
    pub replication_key: Option<String>,

    /// How stored cursor strings are parsed back
    #[serde(default)]
    pub replication_key_type: ReplicationKeyType,

    /// Cap on documents per run
    #[serde(default)]
    pub limit: Option<usize>,

    /// Documents per query
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Explicit field → type tag mapping; disables sampling when set
    #[serde(default, alias = "field_schema")]
    pub schema: Option<BTreeMap<String, String>>,

    /// How incremental runs walk the collection
    #[serde(default)]
    pub pagination: PaginationStrategy,
}

fn default_batch_size() -> usize {
    500
}

impl CollectionSpec {
    /// Create a full-scan spec with defaults
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replication_key: None,
            replication_key_type: ReplicationKeyType::default(),
            limit: None,
            batch_size: default_batch_size(),
            schema: None,
            pagination: PaginationStrategy::default(),
        }
    }

    /// Set the replication key
    #[must_use]
    pub fn with_replication_key(mut self, key: impl Into<String>, kind: ReplicationKeyType) -> Self {
        self.replication_key = Some(key.into());
        self.replication_key_type = kind;
        self
    }

    /// Set the per-run document cap
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the batch size
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Declare an explicit field schema
    #[must_use]
    pub fn with_schema<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.schema = Some(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Set the pagination strategy
    #[must_use]
    pub fn with_pagination(mut self, pagination: PaginationStrategy) -> Self {
        self.pagination = pagination;
        self
    }

    /// Full refresh without a replication key, incremental with one
    pub fn sync_mode(&self) -> SyncMode {
        if self.replication_key.is_some() {
            SyncMode::Incremental
        } else {
            SyncMode::FullRefresh
        }
    }

    /// Check one collection entry
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::missing_field("collections[].name"));
        }
        let field = |suffix: &str| format!("collections[{}].{suffix}", self.name);
        if self.name.starts_with('/') || self.name.ends_with('/') {
            return Err(Error::invalid_value(
                field("name"),
                "must not start or end with '/'",
            ));
        }
        // Collection paths have an odd number of segments
        if self.name.split('/').count() % 2 == 0 {
            return Err(Error::invalid_value(
                field("name"),
                "names a document, not a collection",
            ));
        }
        if self.batch_size == 0 {
            return Err(Error::invalid_value(field("batch_size"), "must be positive"));
        }
        if self.limit == Some(0) {
            return Err(Error::invalid_value(field("limit"), "must be positive"));
        }
        if matches!(&self.replication_key, Some(key) if key.trim().is_empty()) {
            return Err(Error::invalid_value(
                field("replication_key"),
                "must not be empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_minimal_yaml() {
        let yaml = r#"
project_id: demo
collections:
  - name: users
"#;
        let config = TapConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.project_id, "demo");
        assert_eq!(config.database_id, "(default)");
        assert_eq!(config.timeout_seconds, 60);

        let users = &config.collections[0];
        assert_eq!(users.batch_size, 500);
        assert_eq!(users.replication_key_type, ReplicationKeyType::Timestamp);
        assert_eq!(users.pagination, PaginationStrategy::Filtered);
        assert_eq!(users.sync_mode(), SyncMode::FullRefresh);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_json_with_field_schema_alias() {
        let json = r#"{
            "project_id": "demo",
            "credentials_base64": "e30=",
            "collections": [{
                "name": "orders",
                "replication_key": "updated_at",
                "replication_key_type": "integer",
                "limit": 100,
                "batch_size": 50,
                "pagination": "ordered",
                "field_schema": {"total": "number", "tags": "array"}
            }]
        }"#;
        let config = TapConfig::from_json_str(json).unwrap();
        let orders = config.collection("orders").unwrap();

        assert_eq!(orders.replication_key.as_deref(), Some("updated_at"));
        assert_eq!(orders.replication_key_type, ReplicationKeyType::Integer);
        assert_eq!(orders.limit, Some(100));
        assert_eq!(orders.batch_size, 50);
        assert_eq!(orders.pagination, PaginationStrategy::Ordered);
        assert_eq!(orders.sync_mode(), SyncMode::Incremental);
        assert_eq!(orders.schema.as_ref().unwrap()["total"], "number");
        assert_eq!(config.credentials_base64.as_deref(), Some("e30="));
    }

    #[test]
    fn test_validate_rejects_missing_project() {
        let config = TapConfig::from_yaml_str("collections: [{name: users}]").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "project_id"));
    }

    #[test]
    fn test_validate_rejects_bad_collections() {
        let base = TapConfig::from_yaml_str("project_id: demo").unwrap();
        assert!(base.validate().is_err());

        let cases = vec![
            CollectionSpec::new(""),
            CollectionSpec::new("users/u1"),
            CollectionSpec::new("users").with_batch_size(0),
            CollectionSpec::new("users").with_limit(0),
            CollectionSpec::new("users").with_replication_key(" ", ReplicationKeyType::String),
        ];
        for spec in cases {
            let mut config = base.clone();
            config.collections = vec![spec.clone()];
            assert!(config.validate().is_err(), "{spec:?} should be rejected");
        }
    }

    #[test]
    fn test_nested_collection_path_is_valid() {
        assert!(CollectionSpec::new("users/u1/orders").validate().is_ok());
    }

    #[test]
    fn test_api_endpoint_resolution() {
        let mut config = TapConfig::from_yaml_str("project_id: demo").unwrap();
        config.emulator_host = Some("localhost:8080".to_string());
        assert_eq!(config.resolved_api_endpoint(), "http://localhost:8080/v1");

        config.api_endpoint = Some("http://127.0.0.1:9000/v1/".to_string());
        assert_eq!(config.resolved_api_endpoint(), "http://127.0.0.1:9000/v1");
    }

    #[test]
    fn test_malformed_api_endpoint_is_rejected() {
        let mut config =
            TapConfig::from_yaml_str("project_id: demo\ncollections:\n  - name: users\n").unwrap();
        config.api_endpoint = Some("not a url".to_string());
        assert!(matches!(config.validate(), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_from_file_missing() {
        let err = TapConfig::from_file("/nonexistent/config.yaml").unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_from_file_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "project_id: demo\ncollections:\n  - name: users\n").unwrap();

        let config = TapConfig::from_file(&path).unwrap();
        assert_eq!(config.collections.len(), 1);
    }
}
