//! Integration tests using a mock Firestore REST API
//!
//! Tests the full flow: config → credentials → runQuery → records and state

use firestore_tap::config::TapConfig;
use firestore_tap::engine::{Extractor, Message};
use firestore_tap::schema::TypeTag;
use firestore_tap::state::{CheckpointStore, StateManager};
use firestore_tap::store::FirestoreStore;
use firestore_tap::Error;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROOT: &str = "projects/demo/databases/(default)/documents";

fn document(id: &str, updated_at: i64) -> Value {
    json!({
        "document": {
            "name": format!("{ROOT}/events/{id}"),
            "fields": {
                "updated_at": {"integerValue": updated_at.to_string()},
                "title": {"stringValue": format!("event {id}")},
                "where": {"geoPointValue": {"latitude": 1.5, "longitude": -0.5}}
            },
            "createTime": "2024-01-01T00:00:00Z",
            "updateTime": "2024-01-01T00:00:00Z"
        },
        "readTime": "2024-06-01T00:00:00Z"
    })
}

fn emulator_config(server: &MockServer) -> TapConfig {
    let host = server.uri().trim_start_matches("http://").to_string();
    let config = TapConfig::from_yaml_str(&format!(
        r"
project_id: demo
emulator_host: {host}
collections:
  - name: events
    replication_key: updated_at
    replication_key_type: integer
    batch_size: 2
"
    ))
    .unwrap();
    config.validate().unwrap();
    config
}

fn run_query() -> wiremock::matchers::PathRegexMatcher {
    path_regex(r"/v1/projects/demo/databases/.+/documents:runQuery$")
}

async fn mount_events(server: &MockServer) {
    // schema sample
    Mock::given(method("POST"))
        .and(run_query())
        .and(body_partial_json(json!({"structuredQuery": {"limit": 10}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            document("a", 10),
            document("b", 20),
            document("c", 30)
        ])))
        .mount(server)
        .await;

    // second page, after document b
    Mock::given(method("POST"))
        .and(run_query())
        .and(body_partial_json(json!({"structuredQuery": {
            "startAt": {"values": [{"referenceValue": format!("{ROOT}/events/b")}], "before": false}
        }})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            document("c", 30),
            {"readTime": "2024-06-01T00:00:00Z"}
        ])))
        .mount(server)
        .await;

    // first page
    Mock::given(method("POST"))
        .and(run_query())
        .and(header("authorization", "Bearer owner"))
        .and(body_partial_json(json!({"structuredQuery": {"limit": 2}})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([document("a", 10), document("b", 20)])),
        )
        .up_to_n_times(1)
        .mount(server)
        .await;
}

fn records(messages: &[Message]) -> Vec<&serde_json::Map<String, Value>> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Record { record, .. } => Some(record),
            _ => None,
        })
        .collect()
}

// ============================================================================
// End-to-end Tests
// ============================================================================

#[tokio::test]
async fn test_incremental_read_against_emulator() {
    let server = MockServer::start().await;
    mount_events(&server).await;

    let config = emulator_config(&server);
    let store = FirestoreStore::from_config(&config).unwrap();
    let extractor = Extractor::new(Arc::new(store));
    let state = StateManager::in_memory();

    let mut messages: Vec<Message> = Vec::new();
    let stats = extractor
        .run(&config.collections[0], &state, &mut messages)
        .await
        .unwrap();

    assert_eq!(stats.records_synced, 3);
    assert_eq!(stats.documents_fetched, 3);

    let Message::Schema { schema, .. } = &messages[0] else {
        panic!("expected schema first");
    };
    assert_eq!(schema.field_type("updated_at"), Some(&TypeTag::Integer));
    assert_eq!(schema.field_type("title"), Some(&TypeTag::String));
    assert_eq!(schema.field_type("where"), Some(&TypeTag::Object));

    let records = records(&messages);
    assert_eq!(records[0]["_id"], "a");
    assert_eq!(records[2]["_id"], "c");
    assert_eq!(records[1]["updated_at"], 20);
    assert_eq!(records[1]["where"], json!({"latitude": 1.5, "longitude": -0.5}));
    assert!(records[0]["_sdc_extracted_at"]
        .as_str()
        .unwrap()
        .ends_with("+00:00"));

    let last = messages.last().unwrap();
    assert_eq!(last, &Message::state("events", "updated_at", "30"));
}

#[tokio::test]
async fn test_resumed_read_sends_filter() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"documents:runQuery$"))
        .and(body_partial_json(json!({"structuredQuery": {
            "where": {"fieldFilter": {
                "field": {"fieldPath": "updated_at"},
                "op": "GREATER_THAN",
                "value": {"integerValue": "30"}
            }}
        }})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"readTime": "2024-06-01T00:00:00Z"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = emulator_config(&server);
    config.collections[0].schema = Some([("title".to_string(), "string".to_string())].into());

    let extractor = Extractor::new(Arc::new(FirestoreStore::from_config(&config).unwrap()));
    let state = StateManager::in_memory();
    state.write("events", "30").await.unwrap();

    let mut messages: Vec<Message> = Vec::new();
    let stats = extractor
        .run(&config.collections[0], &state, &mut messages)
        .await
        .unwrap();

    assert_eq!(stats.records_synced, 0);
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn test_permission_error_is_fatal_and_named() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "status": "PERMISSION_DENIED"}
        })))
        .mount(&server)
        .await;

    let config = emulator_config(&server);
    let extractor = Extractor::new(Arc::new(FirestoreStore::from_config(&config).unwrap()));

    let mut messages: Vec<Message> = Vec::new();
    let err = extractor
        .run(&config.collections[0], &StateManager::in_memory(), &mut messages)
        .await
        .unwrap_err();

    assert!(matches!(&err, Error::Collection { collection, .. } if collection == "events"));
    assert!(err.to_string().contains("403"));

    // discovery degraded to the minimal schema
    let Message::Schema { schema, .. } = &messages[0] else {
        panic!("expected schema first");
    };
    assert_eq!(schema.fields.len(), 3);
}

#[tokio::test]
async fn test_service_account_token_is_exchanged_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.integration",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex(r"documents:runQuery$"))
        .and(header("authorization", "Bearer ya29.integration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([document("a", 1)])))
        .expect(2)
        .mount(&server)
        .await;

    let key = include_str!("fixtures/test_service_account_key.pem");
    let credentials = json!({
        "type": "service_account",
        "project_id": "demo",
        "private_key_id": "k1",
        "private_key": key.replace('\n', "\\n"),
        "client_email": "tap@demo.iam.gserviceaccount.com",
        "token_uri": format!("{}/token", server.uri())
    });
    let config = TapConfig::from_json_str(
        &json!({
            "project_id": "demo",
            "credentials_json": credentials.to_string(),
            "api_endpoint": format!("{}/v1", server.uri()),
            "collections": [{"name": "events"}]
        })
        .to_string(),
    )
    .unwrap();

    let extractor = Extractor::new(Arc::new(FirestoreStore::from_config(&config).unwrap()));
    let mut messages: Vec<Message> = Vec::new();
    let stats = extractor
        .run(&config.collections[0], &StateManager::in_memory(), &mut messages)
        .await
        .unwrap();

    assert_eq!(stats.records_synced, 1);
    // full refresh: no cursor
    assert!(!messages.iter().any(Message::is_state));
}
