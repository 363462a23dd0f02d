//! Store behavior shared by every `TriggerStore` backing.
#![allow(dead_code)]

use std::collections::BTreeMap;

use nomios_triggers::{
    InMemoryPipelineRunner, Pipeline, PipelineError, SharedTriggerStore, Trigger, TriggerError,
};

pub const FORTUNE: &str = "registry:dockerhub:codefresh:fortune:push";

pub fn trigger(event: &str, names: &[&str]) -> Trigger {
    Trigger::new(
        event,
        "SECRET",
        names
            .iter()
            .map(|n| Pipeline::new(*n, "codefresh-io", "fortune"))
            .collect(),
    )
}

async fn pipeline_names(store: &SharedTriggerStore, id: &str) -> Vec<String> {
    store
        .get(id)
        .await
        .unwrap()
        .pipelines
        .into_iter()
        .map(|p| p.name)
        .collect()
}

pub async fn get_unknown_returns_empty_sentinel(store: SharedTriggerStore) {
    let found = store.get("registry:quay:nobody:nothing:push").await.unwrap();
    assert!(found.is_empty());
    assert_eq!(found, Trigger::EMPTY);
}

pub async fn delete_unknown_is_ok(store: SharedTriggerStore) {
    store.delete("registry:quay:nobody:nothing:push").await.unwrap();
    store.delete("registry:quay:nobody:nothing:push").await.unwrap();
}

pub async fn add_get_delete_roundtrip(store: SharedTriggerStore) {
    store.add(trigger(FORTUNE, &["build", "deploy"])).await.unwrap();

    let found = store.get(FORTUNE).await.unwrap();
    assert_eq!(found.event, FORTUNE);
    assert_eq!(found.secret, "SECRET");
    assert_eq!(pipeline_names(&store, FORTUNE).await, vec!["build", "deploy"]);

    store.delete(FORTUNE).await.unwrap();
    assert!(store.get(FORTUNE).await.unwrap().is_empty());
    assert_eq!(store.secret(FORTUNE).await.unwrap(), None);
}

/// `store` must use `PipelineMerge::Replace`.
pub async fn replace_overwrites_pipelines(store: SharedTriggerStore) {
    store.add(trigger(FORTUNE, &["a", "a"])).await.unwrap();
    store.update(trigger(FORTUNE, &["b"])).await.unwrap();
    assert_eq!(pipeline_names(&store, FORTUNE).await, vec!["b"]);

    // no pipelines left: the trigger is gone, its secret stays until delete
    store.add(trigger(FORTUNE, &[])).await.unwrap();
    assert!(store.get(FORTUNE).await.unwrap().is_empty());
    assert_eq!(store.secret(FORTUNE).await.unwrap().as_deref(), Some("SECRET"));
    assert!(store.list("").await.unwrap().is_empty());
}

/// `store` must use `PipelineMerge::Append`.
pub async fn append_accumulates_pipelines(store: SharedTriggerStore) {
    store.add(trigger(FORTUNE, &["a"])).await.unwrap();
    store.add(trigger(FORTUNE, &["a", "b"])).await.unwrap();
    store.add(trigger(FORTUNE, &[])).await.unwrap();
    assert_eq!(pipeline_names(&store, FORTUNE).await, vec!["a", "a", "b"]);
}

pub async fn list_filters_and_sorts(store: SharedTriggerStore) {
    for id in [
        "registry:quay:codefresh:zeta:push",
        FORTUNE,
        "registry:quay:codefresh:alpha:push",
    ] {
        store.add(trigger(id, &["a"])).await.unwrap();
    }
    // secret only, no pipelines: not listed
    store
        .add(trigger("registry:quay:codefresh:ghost:push", &[]))
        .await
        .unwrap();

    let all: Vec<_> = store
        .list("")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.event)
        .collect();
    assert_eq!(
        all,
        vec![
            FORTUNE,
            "registry:quay:codefresh:alpha:push",
            "registry:quay:codefresh:zeta:push"
        ]
    );

    let quay: Vec<_> = store
        .list("registry:quay:*")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.event)
        .collect();
    assert_eq!(
        quay,
        vec![
            "registry:quay:codefresh:alpha:push",
            "registry:quay:codefresh:zeta:push"
        ]
    );
    assert_eq!(store.list("registry:quay:codefresh:?eta:push").await.unwrap().len(), 1);
    assert!(store.list("helm:*").await.unwrap().is_empty());
}

pub async fn check_secret_without_stored_secret(store: SharedTriggerStore) {
    store.check_secret(FORTUNE, "").await.unwrap();
    let err = store.check_secret(FORTUNE, "guess").await.unwrap_err();
    assert!(matches!(err, TriggerError::InvalidSecret { .. }));
}

pub async fn check_secret_compares_stored_value(store: SharedTriggerStore) {
    store.add(trigger(FORTUNE, &["a"])).await.unwrap();
    store.check_secret(FORTUNE, "SECRET").await.unwrap();
    assert!(store.check_secret(FORTUNE, "SECRET2").await.is_err());
    assert!(store.check_secret(FORTUNE, "").await.is_err());
}

pub async fn run_starts_pipelines_in_order(
    store: SharedTriggerStore,
    runner: InMemoryPipelineRunner,
) {
    store.add(trigger(FORTUNE, &["a", "b"])).await.unwrap();
    let vars = BTreeMap::from([("tag".to_string(), "latest".to_string())]);

    let runs = store.run(FORTUNE, &vars).await.unwrap();
    let ids: Vec<_> = runs.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["build-1", "build-2"]);

    let calls = runner.calls().await;
    assert_eq!(calls[0].name, "a");
    assert_eq!(calls[1].name, "b");
    assert_eq!(calls[1].vars["tag"], "latest");
}

pub async fn run_aborts_on_first_failure(
    store: SharedTriggerStore,
    runner: InMemoryPipelineRunner,
) {
    runner.missing("a").await;
    store.add(trigger(FORTUNE, &["a", "b"])).await.unwrap();

    let err = store.run(FORTUNE, &BTreeMap::new()).await.unwrap_err();
    match err {
        TriggerError::Pipeline(PipelineError::NotFound { name, .. }) => assert_eq!(name, "a"),
        other => panic!("unexpected error: {other}"),
    }
    let calls = runner.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "a");
}

pub async fn run_unknown_trigger_starts_nothing(
    store: SharedTriggerStore,
    runner: InMemoryPipelineRunner,
) {
    let runs = store.run(FORTUNE, &BTreeMap::new()).await.unwrap();
    assert!(runs.is_empty());
    assert!(runner.calls().await.is_empty());
}
