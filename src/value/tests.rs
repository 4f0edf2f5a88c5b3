//! Tests for store values, normalization and ordering

use super::*;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use test_case::test_case;

fn map(entries: Vec<(&str, StoreValue)>) -> BTreeMap<String, StoreValue> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

// ============================================================================
// Normalization Tests
// ============================================================================

#[test_case(StoreValue::Null, json!(null) ; "null")]
#[test_case(StoreValue::ServerTimestamp, json!(null) ; "server timestamp sentinel")]
#[test_case(StoreValue::Boolean(true), json!(true) ; "boolean")]
#[test_case(StoreValue::Integer(-42), json!(-42) ; "integer")]
#[test_case(StoreValue::Double(1.5), json!(1.5) ; "double")]
#[test_case(StoreValue::Double(f64::NAN), json!(null) ; "nan")]
#[test_case(StoreValue::Double(f64::INFINITY), json!(null) ; "infinity")]
#[test_case(StoreValue::string("hello"), json!("hello") ; "string")]
#[test_case(StoreValue::reference("users/alice"), json!("users/alice") ; "reference")]
#[test_case(StoreValue::Bytes(b"raw bytes".to_vec()), json!("raw bytes") ; "utf8 bytes")]
fn test_normalize_scalar(value: StoreValue, expected: serde_json::Value) {
    assert_eq!(normalize(&value), expected);
}

#[test]
fn test_normalize_timestamp_has_utc_offset() {
    let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
    assert_eq!(
        normalize(&StoreValue::Timestamp(ts)),
        json!("2024-01-15T10:30:00+00:00")
    );

    let ts = Utc.timestamp_opt(1_700_000_000, 123_456_000).unwrap();
    assert_eq!(
        normalize(&StoreValue::Timestamp(ts)),
        json!("2023-11-14T22:13:20.123456+00:00")
    );
}

#[test]
fn test_normalize_geopoint() {
    let value = StoreValue::GeoPoint(GeoPoint::new(44.97, -93.26));
    assert_eq!(
        normalize(&value),
        json!({"latitude": 44.97, "longitude": -93.26})
    );
}

#[test]
fn test_normalize_invalid_utf8_is_replaced() {
    let value = StoreValue::Bytes(vec![b'o', b'k', 0xff, 0xfe, b'!']);
    let normalized = normalize(&value);
    let text = normalized.as_str().unwrap();
    assert!(text.starts_with("ok"));
    assert!(text.ends_with('!'));
    assert!(text.contains('\u{fffd}'));
}

#[test]
fn test_normalize_nested() {
    let ts = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let value = StoreValue::Map(map(vec![
        (
            "tags",
            StoreValue::Array(vec![StoreValue::string("a"), StoreValue::Integer(1)]),
        ),
        (
            "owner",
            StoreValue::Map(map(vec![
                ("ref", StoreValue::reference("users/bob")),
                ("since", StoreValue::Timestamp(ts)),
                ("pending", StoreValue::ServerTimestamp),
            ])),
        ),
        (
            "places",
            StoreValue::Array(vec![StoreValue::GeoPoint(GeoPoint::new(1.0, 2.0))]),
        ),
    ]));

    assert_eq!(
        normalize(&value),
        json!({
            "tags": ["a", 1],
            "owner": {
                "ref": "users/bob",
                "since": "2024-03-01T00:00:00+00:00",
                "pending": null
            },
            "places": [{"latitude": 1.0, "longitude": 2.0}]
        })
    );
}

#[test]
fn test_normalize_opaque_with_attributes_drops_internal() {
    let opaque = OpaqueValue::new("vectorValue", "<vector>").with_attributes(map(vec![
        ("dimensions", StoreValue::Integer(3)),
        ("_internal", StoreValue::string("hidden")),
        (
            "values",
            StoreValue::Array(vec![StoreValue::Double(0.5), StoreValue::Double(0.25)]),
        ),
    ]));

    assert_eq!(
        normalize(&StoreValue::Other(opaque)),
        json!({"dimensions": 3, "values": [0.5, 0.25]})
    );
}

#[test]
fn test_normalize_opaque_without_attributes_uses_repr() {
    let opaque = OpaqueValue::new("mysteryValue", "mystery(42)");
    assert_eq!(normalize(&StoreValue::Other(opaque)), json!("mystery(42)"));
}

#[test]
fn test_normalize_is_identity_on_json_safe_values() {
    let samples = vec![
        json!(null),
        json!(true),
        json!(7),
        json!(-3.25),
        json!("text"),
        json!([1, "two", [3.5, null], {"four": false}]),
        json!({"a": {"b": {"c": [1, 2, 3]}}, "d": "e"}),
    ];

    for sample in samples {
        let value = StoreValue::from_plain_json(&sample);
        assert_eq!(normalize(&value), sample);
    }
}

#[test]
fn test_normalize_fields_keeps_keys() {
    let fields = map(vec![
        ("name", StoreValue::string("Alice")),
        ("age", StoreValue::Integer(30)),
    ]);
    let normalized = normalize_fields(&fields);
    assert_eq!(normalized.len(), 2);
    assert_eq!(normalized["name"], json!("Alice"));
    assert_eq!(normalized["age"], json!(30));
}

// ============================================================================
// Document Tests
// ============================================================================

#[test]
fn test_document_identity() {
    let doc = RawDocument::new("users/alice/orders/o-1", BTreeMap::new());
    assert_eq!(doc.id(), "o-1");
    assert_eq!(doc.path(), "users/alice/orders/o-1");
    assert_eq!(doc.reference.collection_path(), "users/alice/orders");
}

#[test]
fn test_document_tombstone() {
    assert!(RawDocument::tombstone("users/gone").is_tombstone());
    assert!(RawDocument::new("users/empty", BTreeMap::new()).is_tombstone());

    let doc = RawDocument::new("users/alice", map(vec![("n", StoreValue::Integer(1))]));
    assert!(!doc.is_tombstone());
    assert_eq!(doc.get("n"), Some(&StoreValue::Integer(1)));
    assert_eq!(doc.get("missing"), None);
}

// ============================================================================
// Ordering Tests
// ============================================================================

#[test]
fn test_store_cmp_across_kinds() {
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let ordered = vec![
        StoreValue::Null,
        StoreValue::Boolean(false),
        StoreValue::Boolean(true),
        StoreValue::Double(f64::NAN),
        StoreValue::Integer(-5),
        StoreValue::Double(2.5),
        StoreValue::Integer(3),
        StoreValue::Timestamp(ts),
        StoreValue::string("a"),
        StoreValue::string("b"),
        StoreValue::Bytes(vec![0]),
        StoreValue::reference("users/a"),
        StoreValue::GeoPoint(GeoPoint::new(0.0, 0.0)),
        StoreValue::Array(vec![]),
        StoreValue::Map(BTreeMap::new()),
    ];

    for pair in ordered.windows(2) {
        assert_eq!(
            store_cmp(&pair[0], &pair[1]),
            Ordering::Less,
            "{:?} should sort before {:?}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_store_cmp_numbers_mix() {
    assert_eq!(
        store_cmp(&StoreValue::Integer(2), &StoreValue::Double(2.0)),
        Ordering::Equal
    );
    assert_eq!(
        store_cmp(&StoreValue::Integer(10), &StoreValue::Integer(9)),
        Ordering::Greater
    );
}

#[test]
fn test_store_cmp_references_by_segment() {
    // "a/b" < "a-c" as flat strings would say otherwise
    assert_eq!(
        store_cmp(
            &StoreValue::reference("users/a/x/1"),
            &StoreValue::reference("users/a-b")
        ),
        Ordering::Less
    );
}
