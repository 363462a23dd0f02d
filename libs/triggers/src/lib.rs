//! Trigger storage for the Nomios trigger manager.
//!
//! A trigger links an event URI to the pipelines it starts. [`TriggerStore`] has an
//! in-memory backing and a Redis backing (`redis-store` feature) with the same behavior;
//! both are handed a [`PipelineRunner`] used by [`TriggerStore::run`].

mod error;
mod memory;
mod model;
pub mod pipeline;
#[cfg(feature = "redis-store")]
mod redis_store;

use std::collections::BTreeMap;
use std::str::FromStr;
use std::{env, sync::Arc};

use async_trait::async_trait;
use nomios_core::PipelineRun;
use regex::Regex;
use subtle::ConstantTimeEq;
use tracing::{debug, error, info};
#[cfg(not(feature = "redis-store"))]
use tracing::warn;

pub use error::TriggerError;
pub use memory::MemoryTriggerStore;
pub use model::{Pipeline, Trigger};
pub use pipeline::{
    CodefreshPipelineRunner, InMemoryPipelineRunner, PipelineError, PipelineRunner,
    SharedPipelineRunner,
};
#[cfg(feature = "redis-store")]
pub use redis_store::RedisTriggerStore;

/// Shared trigger store handle used across handlers.
pub type SharedTriggerStore = Arc<dyn TriggerStore>;

/// What `add`/`update` do with pipelines already linked to the event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PipelineMerge {
    /// The stored list becomes exactly the given pipelines.
    #[default]
    Replace,
    /// Given pipelines are appended to the stored list.
    Append,
}

impl FromStr for PipelineMerge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" | "" => Ok(PipelineMerge::Replace),
            "append" => Ok(PipelineMerge::Append),
            other => Err(format!("unknown pipeline merge mode '{other}'")),
        }
    }
}

#[async_trait]
pub trait TriggerStore: Send + Sync {
    /// Triggers whose id matches the glob `filter` (`*`, `?`; empty matches all), by id.
    async fn list(&self, filter: &str) -> Result<Vec<Trigger>, TriggerError>;

    /// The trigger for `id`, or [`Trigger::EMPTY`] when none exists.
    async fn get(&self, id: &str) -> Result<Trigger, TriggerError>;

    async fn add(&self, trigger: Trigger) -> Result<(), TriggerError>;

    async fn update(&self, trigger: Trigger) -> Result<(), TriggerError> {
        self.add(trigger).await
    }

    /// Removes secret and pipelines of `id`. Unknown ids are not an error.
    async fn delete(&self, id: &str) -> Result<(), TriggerError>;

    /// Stored secret of `id`, if any, even when no pipeline is linked.
    async fn secret(&self, id: &str) -> Result<Option<String>, TriggerError>;

    fn runner(&self) -> &dyn PipelineRunner;

    /// Compares `secret` with the stored one; a missing secret compares as `""`.
    async fn check_secret(&self, id: &str, secret: &str) -> Result<(), TriggerError> {
        let stored = self.secret(id).await?.unwrap_or_default();
        if bool::from(stored.as_bytes().ct_eq(secret.as_bytes())) {
            Ok(())
        } else {
            debug!(trigger = %id, "secret mismatch");
            Err(TriggerError::InvalidSecret { id: id.to_string() })
        }
    }

    /// Starts every pipeline of `id` in stored order.
    ///
    /// The first failure stops the run and is returned as is; pipelines already started
    /// keep running.
    async fn run(
        &self,
        id: &str,
        vars: &BTreeMap<String, String>,
    ) -> Result<Vec<PipelineRun>, TriggerError> {
        let trigger = self.get(id).await?;
        let mut runs = Vec::with_capacity(trigger.pipelines.len());
        for pipeline in &trigger.pipelines {
            let build = self
                .runner()
                .run_pipeline(
                    &pipeline.name,
                    &pipeline.repo_owner,
                    &pipeline.repo_name,
                    vars,
                )
                .await
                .inspect_err(|err| {
                    error!(trigger = %id, pipeline = %pipeline.name, error = %err, "failed to run pipeline")
                })?;
            info!(trigger = %id, pipeline = %pipeline.name, build = %build, "pipeline started");
            runs.push(PipelineRun::started(build));
        }
        Ok(runs)
    }
}

/// Backing selection for [`open_store`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub redis_url: Option<String>,
    pub namespace: String,
    pub merge: PipelineMerge,
}

impl StoreConfig {
    /// Reads `TRIGGER_REDIS_URL`, `TRIGGER_NAMESPACE` and `TRIGGER_PIPELINE_MERGE`.
    pub fn from_env() -> Result<Self, String> {
        let merge = match env::var("TRIGGER_PIPELINE_MERGE") {
            Ok(raw) => raw.parse()?,
            Err(_) => PipelineMerge::default(),
        };
        Ok(Self {
            redis_url: env::var("TRIGGER_REDIS_URL").ok().filter(|u| !u.is_empty()),
            namespace: env::var("TRIGGER_NAMESPACE").unwrap_or_else(|_| "nomios".into()),
            merge,
        })
    }
}

/// Builds the configured store. Falls back to memory when Redis is not compiled in.
pub async fn open_store(
    config: &StoreConfig,
    runner: SharedPipelineRunner,
) -> Result<SharedTriggerStore, TriggerError> {
    match &config.redis_url {
        Some(url) => build_redis_store(url, config, runner).await,
        None => Ok(Arc::new(
            MemoryTriggerStore::new(runner).with_merge(config.merge),
        )),
    }
}

#[cfg(feature = "redis-store")]
async fn build_redis_store(
    url: &str,
    config: &StoreConfig,
    runner: SharedPipelineRunner,
) -> Result<SharedTriggerStore, TriggerError> {
    let store = RedisTriggerStore::connect(url, &config.namespace, runner)
        .await?
        .with_merge(config.merge);
    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis-store"))]
async fn build_redis_store(
    _url: &str,
    config: &StoreConfig,
    runner: SharedPipelineRunner,
) -> Result<SharedTriggerStore, TriggerError> {
    warn!("redis-store feature disabled; using in-memory trigger store");
    Ok(Arc::new(
        MemoryTriggerStore::new(runner).with_merge(config.merge),
    ))
}

/// Compiles a `*`/`?` glob into an anchored regex; other characters match literally.
/// An empty filter matches everything.
pub(crate) fn glob_regex(filter: &str) -> Result<Regex, TriggerError> {
    let filter = if filter.is_empty() { "*" } else { filter };
    let mut pattern = String::with_capacity(filter.len() + 2);
    pattern.push('^');
    for ch in filter.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).map_err(|err| TriggerError::Backend(Box::new(err)))
}
