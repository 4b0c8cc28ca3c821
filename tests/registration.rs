//! Schema registration against a mock Schema Registry.

use std::time::Duration;

use raw_kafka_gateway::kafka::{
    KafkaCodec, RegistryError, SchemaRegistrar, SchemaRole, ValueSchema,
};

mod common;

const SCHEMA: &str = r#"{"type":"record","name":"RequestInfo","fields":[]}"#;

fn registrar() -> SchemaRegistrar {
    SchemaRegistrar::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_register_returns_registry_id() {
    let registry = common::start_programmable_backend(200, &[], r#"{"id": 999}"#).await;

    let codec = KafkaCodec::register(
        ValueSchema::new(SCHEMA),
        &registrar(),
        &registry.url(),
        "AnyTopic",
    )
    .await
    .expect("registration should succeed");

    assert_eq!(codec.value_schema_id(), 999);
    assert_eq!(codec.value_schema(), SCHEMA);

    let requests = registry.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/subjects/AnyTopic-value/versions");
    assert_eq!(
        requests[0].content_type.as_deref(),
        Some("application/vnd.schemaregistry.v1+json")
    );
    assert_eq!(requests[0].json(), serde_json::json!({ "schema": SCHEMA }));
}

#[tokio::test]
async fn test_register_keeps_endpoint_path() {
    let registry = common::start_programmable_backend(200, &[], r#"{"id": 7}"#).await;
    let endpoint = format!("{}/registry/", registry.url());

    let id = registrar()
        .register(SCHEMA, SchemaRole::Key, &endpoint, "Clicks")
        .await
        .unwrap();

    assert_eq!(id, 7);
    assert_eq!(registry.requests()[0].path, "/registry/subjects/Clicks-key/versions");
}

#[tokio::test]
async fn test_register_rejected_status() {
    let registry = common::start_programmable_backend(
        409,
        &[],
        r#"{"error_code":409,"message":"incompatible schema"}"#,
    )
    .await;

    let err = registrar()
        .register(SCHEMA, SchemaRole::Value, &registry.url(), "AnyTopic")
        .await
        .unwrap_err();

    match err {
        RegistryError::Rejected { status, body } => {
            assert_eq!(status.as_u16(), 409);
            assert!(body.contains("incompatible schema"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_register_malformed_response() {
    for body in ["not json", r#"{"version": 1}"#, r#"{"id": "999"}"#] {
        let registry = common::start_programmable_backend(200, &[], body).await;

        let err = registrar()
            .register(SCHEMA, SchemaRole::Value, &registry.url(), "AnyTopic")
            .await
            .unwrap_err();

        assert!(
            matches!(err, RegistryError::Malformed { .. }),
            "body {:?} gave {}",
            body,
            err
        );
    }
}

#[tokio::test]
async fn test_register_unreachable_registry() {
    let addr = common::closed_addr().await;

    let err = registrar()
        .register(SCHEMA, SchemaRole::Value, &format!("http://{}", addr), "AnyTopic")
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::Request(_)));
}

#[tokio::test]
async fn test_register_invalid_topic_skips_network() {
    let registry = common::start_programmable_backend(200, &[], r#"{"id": 1}"#).await;

    let err = registrar()
        .register(SCHEMA, SchemaRole::Value, &registry.url(), "")
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::InvalidTopic(_)));
    assert!(registry.requests().is_empty());
}

#[tokio::test]
async fn test_register_truncated_response() {
    let addr = common::start_truncating_backend().await;

    let err = registrar()
        .register(SCHEMA, SchemaRole::Value, &format!("http://{}", addr), "AnyTopic")
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::ReadBody(_)), "unexpected error: {:?}", err);
}
