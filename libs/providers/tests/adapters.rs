use std::collections::BTreeMap;

use nomios_core::{PayloadDecodeError, vars};
use nomios_dispatch::{DispatchError, InMemoryTriggerClient};
use nomios_providers::{
    AzureAdapter, DockerHubAdapter, IngestError, IngestOutcome, JFrogAdapter, JFrogHelmAdapter,
    QuayAdapter, WebhookAdapter, WebhookQuery, ingest,
};
use serde_json::{Value, json};

const DOCKERHUB: &str = r#"{
    "repository": {"namespace": "codefresh", "name": "fortune"},
    "push_data": {"tag": "latest", "pusher": "alexeiled", "pushed_at": 1512920349}
}"#;

fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn jfrog_body(event: &str) -> Vec<u8> {
    json!({
        "artifactory": {"webhook": {
            "event": event,
            "data": {
                "docker": {"image": "fortune", "tag": "1.2.0"},
                "event": {
                    "modifiedBy": "admin",
                    "created": 1512920349000_i64,
                    "repoPath": {"repoKey": "docker-local"}
                }
            }
        }}
    })
    .to_string()
    .into_bytes()
}

#[test]
fn dockerhub_example_maps_exactly() {
    let out = DockerHubAdapter
        .normalise(DOCKERHUB.as_bytes(), &WebhookQuery::new("SECRET", ""))
        .unwrap()
        .expect("dockerhub always emits");

    assert_eq!(out.uri.to_string(), "registry:dockerhub:codefresh:fortune:push");
    assert_eq!(out.event.secret, "SECRET");
    assert_eq!(
        out.event.variables,
        map(&[
            ("namespace", "codefresh"),
            ("name", "fortune"),
            ("tag", "latest"),
            ("pusher", "alexeiled"),
            ("pushed_at", "2017-12-10T15:39:09Z"),
        ])
    );
    let original: Value = serde_json::from_str(&out.event.original).unwrap();
    assert_eq!(original["push_data"]["pusher"], "alexeiled");
}

#[test]
fn account_lands_in_uri() {
    let out = DockerHubAdapter
        .normalise(
            DOCKERHUB.as_bytes(),
            &WebhookQuery::new("SECRET", "cb1e73c5215b"),
        )
        .unwrap()
        .unwrap();
    assert_eq!(
        out.uri.to_string(),
        "registry:dockerhub:codefresh:fortune:push:cb1e73c5215b"
    );
}

#[test]
fn quay_without_tags_omits_tag() {
    let body = br#"{
        "name": "fortune", "namespace": "codefresh",
        "homepage": "https://quay.io/repository/codefresh/fortune",
        "updated_tags": []
    }"#;
    let out = QuayAdapter
        .normalise(body, &WebhookQuery::new("s", ""))
        .unwrap()
        .unwrap();

    assert_eq!(out.uri.to_string(), "registry:quay:codefresh:fortune:push");
    assert!(!out.event.variables.contains_key(vars::TAG));
    assert_eq!(out.event.get(vars::EVENT), Some("push"));
    assert_eq!(out.event.get(vars::PROVIDER), Some("quay"));
    assert_eq!(out.event.get(vars::TYPE), Some("registry"));
    assert_eq!(
        out.event.get(vars::URL),
        Some("https://quay.io/repository/codefresh/fortune")
    );
}

#[test]
fn jfrog_tag_created_is_mapped() {
    let out = JFrogAdapter
        .normalise(&jfrog_body("docker.tagCreated"), &WebhookQuery::new("s", ""))
        .unwrap()
        .unwrap();
    assert_eq!(out.uri.to_string(), "registry:jfrog:docker-local:fortune:push");
    assert_eq!(
        out.event.variables,
        map(&[
            ("event", "docker.tagCreated"),
            ("namespace", "docker-local"),
            ("name", "fortune"),
            ("tag", "1.2.0"),
            ("pusher", "admin"),
            ("pushed_at", "2017-12-10T15:39:09Z"),
        ])
    );
}

#[test]
fn jfrog_other_events_are_skipped() {
    let out = JFrogAdapter
        .normalise(&jfrog_body("docker.tagPromoted"), &WebhookQuery::new("s", ""))
        .unwrap();
    assert!(out.is_none());
}

#[test]
fn jfrog_helm_uses_helm_family() {
    let body = json!({
        "artifactory": {"webhook": {
            "event": "storage.afterCreate",
            "data": {
                "modifiedBy": "admin",
                "created": 1512920349000_i64,
                "repoPath": {"repoKey": "helm-local", "name": "mychart-0.1.0.tgz"}
            }
        }}
    })
    .to_string();
    let out = JFrogHelmAdapter
        .normalise(body.as_bytes(), &WebhookQuery::new("s", ""))
        .unwrap()
        .unwrap();
    assert_eq!(
        out.uri.to_string(),
        "helm:jfrog:helm-local:mychart-0.1.0.tgz:push"
    );
    assert!(out.uri.validate().is_ok());
    assert_eq!(out.event.get(vars::PUSHER), Some("admin"));
}

#[test]
fn jfrog_helm_skips_deletes() {
    let body = br#"{"artifactory":{"webhook":{"event":"storage.afterDelete"}}}"#;
    assert!(
        JFrogHelmAdapter
            .normalise(body, &WebhookQuery::default())
            .unwrap()
            .is_none()
    );
}

#[test]
fn azure_push_is_mapped() {
    let body = br#"{
        "action": "push",
        "timestamp": "2019-04-01T10:00:00.000Z",
        "target": {"repository": "codefresh/fortune", "tag": "v1"},
        "request": {"host": "myregistry.azurecr.io"}
    }"#;
    let out = AzureAdapter
        .normalise(body, &WebhookQuery::new("s", ""))
        .unwrap()
        .unwrap();
    assert_eq!(out.uri.to_string(), "registry:azure:myregistry:fortune:push");
    assert_eq!(
        out.event.variables,
        map(&[
            ("event", "push"),
            ("namespace", "myregistry"),
            ("name", "fortune"),
            ("tag", "v1"),
            ("pushed_at", "2019-04-01T10:00:00.000Z"),
        ])
    );
}

#[test]
fn azure_delete_is_skipped() {
    let body = br#"{"action": "delete", "target": {"repository": "a/b"}}"#;
    assert!(
        AzureAdapter
            .normalise(body, &WebhookQuery::default())
            .unwrap()
            .is_none()
    );
}

#[test]
fn malformed_body_is_a_decode_error() {
    let err = QuayAdapter
        .normalise(b"{\"name\": ", &WebhookQuery::default())
        .unwrap_err();
    assert!(matches!(err, PayloadDecodeError::Decode(_)));

    let err = DockerHubAdapter
        .normalise(br#"{"push_data": {"pushed_at": "yesterday"}}"#, &WebhookQuery::default())
        .unwrap_err();
    assert!(matches!(err, PayloadDecodeError::Decode(_)));
}

#[tokio::test]
async fn ingest_dispatches_exactly_once() {
    let client = InMemoryTriggerClient::new();
    let outcome = ingest(
        &DockerHubAdapter,
        &client,
        DOCKERHUB.as_bytes(),
        &WebhookQuery::new("SECRET", ""),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, IngestOutcome::Dispatched { .. }));
    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "registry:dockerhub:codefresh:fortune:push");
    assert_eq!(calls[0].1.secret, "SECRET");
}

#[tokio::test]
async fn ingest_skips_without_dispatch() {
    let client = InMemoryTriggerClient::new();
    let outcome = ingest(
        &JFrogAdapter,
        &client,
        &jfrog_body("docker.tagPromoted"),
        &WebhookQuery::default(),
    )
    .await
    .unwrap();
    assert_eq!(outcome, IngestOutcome::Skipped);
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn ingest_rejects_invalid_uri_before_dispatch() {
    let client = InMemoryTriggerClient::new();
    let body = br#"{"repository":{"namespace":"Code Fresh","name":"fortune"}}"#;
    let err = ingest(&DockerHubAdapter, &client, body, &WebhookQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::InvalidUri(_)));
    assert!(client.calls().is_empty());

    let err = ingest(
        &DockerHubAdapter,
        &client,
        DOCKERHUB.as_bytes(),
        &WebhookQuery::new("s", "not-hex"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, IngestError::InvalidUri(_)));
}

#[tokio::test]
async fn ingest_surfaces_dispatch_failure() {
    let client = InMemoryTriggerClient::failing(500);
    let err = ingest(
        &QuayAdapter,
        &client,
        br#"{"namespace":"codefresh","name":"fortune"}"#,
        &WebhookQuery::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Dispatch(DispatchError::Status { status: 500, .. })
    ));
    assert_eq!(client.calls().len(), 1);
}
