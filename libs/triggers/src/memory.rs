use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::{
    Pipeline, PipelineMerge, PipelineRunner, SharedPipelineRunner, Trigger, TriggerError,
    TriggerStore, glob_regex,
};

/// Process-local store. Secrets and pipeline lists are kept apart so a secret can
/// outlive its pipelines, as with the Redis backing.
pub struct MemoryTriggerStore {
    secrets: DashMap<String, String>,
    pipelines: DashMap<String, Vec<Pipeline>>,
    merge: PipelineMerge,
    runner: SharedPipelineRunner,
}

impl MemoryTriggerStore {
    pub fn new(runner: SharedPipelineRunner) -> Self {
        Self {
            secrets: DashMap::new(),
            pipelines: DashMap::new(),
            merge: PipelineMerge::default(),
            runner,
        }
    }

    pub fn with_merge(mut self, merge: PipelineMerge) -> Self {
        self.merge = merge;
        self
    }

    fn snapshot(&self, id: &str) -> Trigger {
        match self.pipelines.get(id) {
            Some(entry) if !entry.value().is_empty() => Trigger {
                event: id.to_string(),
                secret: self
                    .secrets
                    .get(id)
                    .map(|s| s.value().clone())
                    .unwrap_or_default(),
                pipelines: entry.value().clone(),
            },
            _ => Trigger::EMPTY,
        }
    }
}

#[async_trait]
impl TriggerStore for MemoryTriggerStore {
    async fn list(&self, filter: &str) -> Result<Vec<Trigger>, TriggerError> {
        let re = glob_regex(filter)?;
        let ids: Vec<String> = self
            .pipelines
            .iter()
            .filter(|entry| re.is_match(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        let mut triggers: Vec<Trigger> = ids
            .iter()
            .map(|id| self.snapshot(id))
            .filter(|t| !t.is_empty())
            .collect();
        triggers.sort_by(|a, b| a.event.cmp(&b.event));
        Ok(triggers)
    }

    async fn get(&self, id: &str) -> Result<Trigger, TriggerError> {
        Ok(self.snapshot(id))
    }

    async fn add(&self, trigger: Trigger) -> Result<(), TriggerError> {
        debug!(trigger = %trigger.event, merge = ?self.merge, "adding trigger");
        self.secrets
            .insert(trigger.event.clone(), trigger.secret.clone());
        match self.merge {
            PipelineMerge::Replace => {
                if trigger.pipelines.is_empty() {
                    self.pipelines.remove(&trigger.event);
                } else {
                    self.pipelines.insert(trigger.event, trigger.pipelines);
                }
            }
            PipelineMerge::Append => {
                if !trigger.pipelines.is_empty() {
                    self.pipelines
                        .entry(trigger.event)
                        .or_default()
                        .extend(trigger.pipelines);
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), TriggerError> {
        debug!(trigger = %id, "deleting trigger");
        self.secrets.remove(id);
        self.pipelines.remove(id);
        Ok(())
    }

    async fn secret(&self, id: &str) -> Result<Option<String>, TriggerError> {
        Ok(self.secrets.get(id).map(|s| s.value().clone()))
    }

    fn runner(&self) -> &dyn PipelineRunner {
        self.runner.as_ref()
    }
}
