//! Runs the shared store scenarios against a live Redis named by `TRIGGER_REDIS_URL`.
#![cfg(feature = "redis-store")]

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use nomios_triggers::{
    InMemoryPipelineRunner, PipelineMerge, RedisTriggerStore, SharedTriggerStore,
};

static NEXT: AtomicUsize = AtomicUsize::new(0);

/// Every store gets its own key namespace so tests do not see each other's keys.
async fn store_with(merge: PipelineMerge) -> Option<(SharedTriggerStore, InMemoryPipelineRunner)> {
    let Some(url) = std::env::var("TRIGGER_REDIS_URL").ok().filter(|u| !u.is_empty()) else {
        eprintln!("skipping redis trigger store test: TRIGGER_REDIS_URL not set");
        return None;
    };
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let namespace = format!(
        "nomios-test-{}-{stamp}-{}",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::SeqCst)
    );
    let runner = InMemoryPipelineRunner::new();
    let store = RedisTriggerStore::connect(&url, namespace, Arc::new(runner.clone()))
        .await
        .expect("connect to redis")
        .with_merge(merge);
    Some((Arc::new(store), runner))
}

async fn store() -> Option<SharedTriggerStore> {
    store_with(PipelineMerge::Replace).await.map(|(store, _)| store)
}

#[tokio::test]
async fn get_unknown_returns_empty_sentinel() {
    let Some(store) = store().await else { return };
    common::get_unknown_returns_empty_sentinel(store).await;
}

#[tokio::test]
async fn delete_unknown_is_ok() {
    let Some(store) = store().await else { return };
    common::delete_unknown_is_ok(store).await;
}

#[tokio::test]
async fn add_get_delete_roundtrip() {
    let Some(store) = store().await else { return };
    common::add_get_delete_roundtrip(store).await;
}

#[tokio::test]
async fn replace_overwrites_pipelines() {
    let Some(store) = store().await else { return };
    common::replace_overwrites_pipelines(store).await;
}

#[tokio::test]
async fn append_accumulates_pipelines() {
    let Some((store, _)) = store_with(PipelineMerge::Append).await else {
        return;
    };
    common::append_accumulates_pipelines(store).await;
}

#[tokio::test]
async fn list_filters_and_sorts() {
    let Some(store) = store().await else { return };
    common::list_filters_and_sorts(store).await;
}

#[tokio::test]
async fn check_secret_without_stored_secret() {
    let Some(store) = store().await else { return };
    common::check_secret_without_stored_secret(store).await;
}

#[tokio::test]
async fn check_secret_compares_stored_value() {
    let Some(store) = store().await else { return };
    common::check_secret_compares_stored_value(store).await;
}

#[tokio::test]
async fn run_starts_pipelines_in_order() {
    let Some((store, runner)) = store_with(PipelineMerge::Replace).await else {
        return;
    };
    common::run_starts_pipelines_in_order(store, runner).await;
}

#[tokio::test]
async fn run_aborts_on_first_failure() {
    let Some((store, runner)) = store_with(PipelineMerge::Replace).await else {
        return;
    };
    common::run_aborts_on_first_failure(store, runner).await;
}

#[tokio::test]
async fn run_unknown_trigger_starts_nothing() {
    let Some((store, runner)) = store_with(PipelineMerge::Replace).await else {
        return;
    };
    common::run_unknown_trigger_starts_nothing(store, runner).await;
}
