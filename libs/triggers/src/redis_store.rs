use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    Pipeline, PipelineMerge, PipelineRunner, SharedPipelineRunner, Trigger, TriggerError,
    TriggerStore,
};

/// Redis backing.
///
/// The secret lives in the string `<ns>:secret:<id>`; pipelines are JSON entries of the
/// list `<ns>:trigger:<id>` so order and duplicates survive. Writes go through `MULTI`.
pub struct RedisTriggerStore {
    namespace: String,
    connection: Mutex<redis::aio::ConnectionManager>,
    merge: PipelineMerge,
    runner: SharedPipelineRunner,
}

impl RedisTriggerStore {
    pub async fn connect(
        url: &str,
        namespace: impl Into<String>,
        runner: SharedPipelineRunner,
    ) -> Result<Self, TriggerError> {
        let client = redis::Client::open(url)?;
        let manager = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self {
            namespace: namespace.into(),
            connection: Mutex::new(manager),
            merge: PipelineMerge::default(),
            runner,
        })
    }

    pub fn with_merge(mut self, merge: PipelineMerge) -> Self {
        self.merge = merge;
        self
    }

    fn trigger_prefix(&self) -> String {
        format!("{}:trigger:", self.namespace)
    }

    fn trigger_key(&self, id: &str) -> String {
        format!("{}{id}", self.trigger_prefix())
    }

    fn secret_key(&self, id: &str) -> String {
        format!("{}:secret:{id}", self.namespace)
    }
}

/// Escapes Redis glob syntax other than `*` and `?`.
fn redis_pattern(filter: &str) -> String {
    if filter.is_empty() {
        return "*".into();
    }
    let mut out = String::with_capacity(filter.len());
    for ch in filter.chars() {
        if matches!(ch, '[' | ']' | '\\' | '^') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[async_trait]
impl TriggerStore for RedisTriggerStore {
    async fn list(&self, filter: &str) -> Result<Vec<Trigger>, TriggerError> {
        let pattern = format!("{}{}", self.trigger_prefix(), redis_pattern(filter));
        let keys: Vec<String> = {
            let mut conn = self.connection.lock().await;
            redis::cmd("KEYS")
                .arg(&pattern)
                .query_async(&mut *conn)
                .await?
        };
        debug!(pattern = %pattern, found = keys.len(), "listing triggers");

        let prefix = self.trigger_prefix();
        let mut triggers = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(id) = key.strip_prefix(&prefix) else {
                continue;
            };
            let trigger = self.get(id).await?;
            if !trigger.is_empty() {
                triggers.push(trigger);
            }
        }
        triggers.sort_by(|a, b| a.event.cmp(&b.event));
        Ok(triggers)
    }

    async fn get(&self, id: &str) -> Result<Trigger, TriggerError> {
        let (secret, raw): (Option<String>, Vec<String>) = {
            let mut conn = self.connection.lock().await;
            redis::pipe()
                .cmd("GET")
                .arg(self.secret_key(id))
                .cmd("LRANGE")
                .arg(self.trigger_key(id))
                .arg(0)
                .arg(-1)
                .query_async(&mut *conn)
                .await?
        };
        if raw.is_empty() {
            return Ok(Trigger::EMPTY);
        }
        let pipelines = raw
            .iter()
            .map(|p| serde_json::from_str::<Pipeline>(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Trigger {
            event: id.to_string(),
            secret: secret.unwrap_or_default(),
            pipelines,
        })
    }

    async fn add(&self, trigger: Trigger) -> Result<(), TriggerError> {
        debug!(trigger = %trigger.event, merge = ?self.merge, "adding trigger");
        let encoded = trigger
            .pipelines
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        let trigger_key = self.trigger_key(&trigger.event);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("SET")
            .arg(self.secret_key(&trigger.event))
            .arg(&trigger.secret)
            .ignore();
        if self.merge == PipelineMerge::Replace {
            pipe.cmd("DEL").arg(&trigger_key).ignore();
        }
        if !encoded.is_empty() {
            pipe.cmd("RPUSH").arg(&trigger_key).arg(encoded).ignore();
        }

        let mut conn = self.connection.lock().await;
        pipe.query_async::<()>(&mut *conn).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), TriggerError> {
        debug!(trigger = %id, "deleting trigger");
        let mut conn = self.connection.lock().await;
        redis::pipe()
            .atomic()
            .cmd("DEL")
            .arg(self.secret_key(id))
            .ignore()
            .cmd("DEL")
            .arg(self.trigger_key(id))
            .ignore()
            .query_async::<()>(&mut *conn)
            .await?;
        Ok(())
    }

    async fn secret(&self, id: &str) -> Result<Option<String>, TriggerError> {
        let mut conn = self.connection.lock().await;
        let secret: Option<String> = redis::cmd("GET")
            .arg(self.secret_key(id))
            .query_async(&mut *conn)
            .await?;
        Ok(secret)
    }

    fn runner(&self) -> &dyn PipelineRunner {
        self.runner.as_ref()
    }
}
