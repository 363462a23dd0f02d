mod common;

use std::sync::Arc;

use nomios_triggers::{
    InMemoryPipelineRunner, MemoryTriggerStore, PipelineMerge, SharedTriggerStore,
};

fn store_with(merge: PipelineMerge) -> (SharedTriggerStore, InMemoryPipelineRunner) {
    let runner = InMemoryPipelineRunner::new();
    let store = MemoryTriggerStore::new(Arc::new(runner.clone())).with_merge(merge);
    (Arc::new(store), runner)
}

fn store() -> SharedTriggerStore {
    store_with(PipelineMerge::Replace).0
}

#[tokio::test]
async fn get_unknown_returns_empty_sentinel() {
    common::get_unknown_returns_empty_sentinel(store()).await;
}

#[tokio::test]
async fn delete_unknown_is_ok() {
    common::delete_unknown_is_ok(store()).await;
}

#[tokio::test]
async fn add_get_delete_roundtrip() {
    common::add_get_delete_roundtrip(store()).await;
}

#[tokio::test]
async fn replace_overwrites_pipelines() {
    common::replace_overwrites_pipelines(store()).await;
}

#[tokio::test]
async fn append_accumulates_pipelines() {
    common::append_accumulates_pipelines(store_with(PipelineMerge::Append).0).await;
}

#[tokio::test]
async fn list_filters_and_sorts() {
    common::list_filters_and_sorts(store()).await;
}

#[tokio::test]
async fn check_secret_without_stored_secret() {
    common::check_secret_without_stored_secret(store()).await;
}

#[tokio::test]
async fn check_secret_compares_stored_value() {
    common::check_secret_compares_stored_value(store()).await;
}

#[tokio::test]
async fn run_starts_pipelines_in_order() {
    let (store, runner) = store_with(PipelineMerge::Replace);
    common::run_starts_pipelines_in_order(store, runner).await;
}

#[tokio::test]
async fn run_aborts_on_first_failure() {
    let (store, runner) = store_with(PipelineMerge::Replace);
    common::run_aborts_on_first_failure(store, runner).await;
}

#[tokio::test]
async fn run_unknown_trigger_starts_nothing() {
    let (store, runner) = store_with(PipelineMerge::Replace);
    common::run_unknown_trigger_starts_nothing(store, runner).await;
}
