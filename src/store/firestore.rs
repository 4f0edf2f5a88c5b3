//! Firestore REST adapter
//!
//! Queries go to `documents:runQuery` under the collection's parent
//! document, as a `structuredQuery`.

use super::codec::{decode_document, encode_value};
use super::types::{FieldFilter, Query};
use super::DocumentStore;
use crate::auth::{resolve_credentials, CredentialSource};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig};
use crate::types::{JsonValue, DOCUMENT_ID_PATH};
use crate::value::RawDocument;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Document store backed by the Firestore REST API
#[derive(Debug)]
pub struct FirestoreStore {
    http: HttpClient,
    endpoint: String,
    project_id: String,
    database_id: String,
}

impl FirestoreStore {
    /// Create a store over an existing HTTP client
    pub fn new(
        http: HttpClient,
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        database_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            database_id: database_id.into(),
        }
    }

    /// Resolve credentials and build an authenticated store
    pub fn from_config(config: &TapConfig) -> Result<Self> {
        let source = CredentialSource::from_config(config);
        let credentials = resolve_credentials(&source)?;
        info!(
            "Connecting to project '{}' database '{}' ({} credentials)",
            config.project_id,
            config.database_id,
            credentials.kind()
        );

        let mut http_config =
            HttpClientConfig::builder().timeout(Duration::from_secs(config.timeout_seconds));
        if let Some(rps) = config.requests_per_second {
            http_config = http_config.rate_limit(RateLimiterConfig::per_second(rps));
        }
        let http = HttpClient::with_credentials(http_config.build(), credentials)?;

        Ok(Self::new(
            http,
            config.resolved_api_endpoint(),
            &config.project_id,
            &config.database_id,
        ))
    }

    /// `projects/{p}/databases/{d}/documents`
    pub fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database_id
        )
    }

    /// URL of the `runQuery` call for a collection path
    pub fn run_query_url(&self, collection: &str) -> String {
        let root = self.documents_root();
        match split_collection_path(collection).0 {
            Some(parent) => format!("{}/{root}/{parent}:runQuery", self.endpoint),
            None => format!("{}/{root}:runQuery", self.endpoint),
        }
    }

    /// The `runQuery` request body for a query
    pub fn request_body(&self, query: &Query) -> JsonValue {
        let root = self.documents_root();
        let (_, collection_id) = split_collection_path(&query.collection);

        let mut structured = json!({
            "from": [{"collectionId": collection_id}],
        });

        let mut filters: Vec<JsonValue> = query
            .filters
            .iter()
            .map(|f| encode_filter(f, &root))
            .collect();
        if filters.len() == 1 {
            structured["where"] = filters.remove(0);
        } else if filters.len() > 1 {
            structured["where"] = json!({
                "compositeFilter": {"op": "AND", "filters": filters}
            });
        }

        if !query.order_by.is_empty() {
            let order: Vec<JsonValue> = query
                .order_by
                .iter()
                .map(|field| {
                    json!({
                        "field": {"fieldPath": quote_field_path(field)},
                        "direction": "ASCENDING"
                    })
                })
                .collect();
            structured["orderBy"] = JsonValue::Array(order);
        }

        if let Some(cursor) = &query.start_after {
            let values: Vec<JsonValue> = cursor.iter().map(|v| encode_value(v, &root)).collect();
            structured["startAt"] = json!({"values": values, "before": false});
        }

        if let Some(limit) = query.limit {
            structured["limit"] = json!(limit);
        }

        json!({ "structuredQuery": structured })
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn run_query(&self, query: &Query) -> Result<Vec<RawDocument>> {
        let url = self.run_query_url(&query.collection);
        debug!(
            "runQuery on '{}' (limit {:?}, cursor {})",
            query.collection,
            query.limit,
            query.start_after.is_some()
        );

        let response: JsonValue = self
            .http
            .post_json(&url, self.request_body(query))
            .await?;

        let entries = response
            .as_array()
            .ok_or_else(|| Error::decode("runQuery response is not an array"))?;

        let root = self.documents_root();
        entries
            .iter()
            .filter_map(|entry| entry.get("document"))
            .map(|document| decode_document(document, &root))
            .collect()
    }
}

/// Split `users/u1/orders` into (`Some("users/u1")`, `"orders"`)
fn split_collection_path(path: &str) -> (Option<&str>, &str) {
    match path.rsplit_once('/') {
        Some((parent, id)) => (Some(parent), id),
        None => (None, path),
    }
}

fn encode_filter(filter: &FieldFilter, root: &str) -> JsonValue {
    json!({
        "fieldFilter": {
            "field": {"fieldPath": quote_field_path(&filter.field)},
            "op": filter.op.as_str(),
            "value": encode_value(&filter.value, root),
        }
    })
}

/// Backtick-quote a top-level field name unless it is a simple identifier
fn quote_field_path(field: &str) -> String {
    let simple = field == DOCUMENT_ID_PATH
        || (field
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    if simple {
        field.to_string()
    } else {
        format!("`{}`", field.replace('\\', "\\\\").replace('`', "\\`"))
    }
}
