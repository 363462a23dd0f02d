use nomios_core::{EventUri, PayloadDecodeError, Provider, rfc3339_from_unix_millis, vars};
use serde::Deserialize;
use tracing::debug;

use crate::{Normalized, ProviderKind, WebhookAdapter, WebhookQuery, decode};

pub(crate) const TAG_CREATED: &str = "docker.tagCreated";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Payload {
    artifactory: Artifactory,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Artifactory {
    webhook: Webhook,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Webhook {
    event: String,
    data: Data,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Data {
    docker: Docker,
    event: EventData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Docker {
    tag: String,
    image: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EventData {
    modified_by: String,
    /// Milliseconds since the epoch.
    created: i64,
    repo_path: RepoPath,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RepoPath {
    repo_key: String,
}

/// Artifactory docker repository webhooks; only `docker.tagCreated` is dispatched.
#[derive(Debug, Default, Clone, Copy)]
pub struct JFrogAdapter;

impl WebhookAdapter for JFrogAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::JFrog
    }

    fn normalise(
        &self,
        body: &[u8],
        query: &WebhookQuery,
    ) -> Result<Option<Normalized>, PayloadDecodeError> {
        let (payload, mut event) = decode::<Payload>(body, &query.secret)?;
        let hook = payload.artifactory.webhook;
        if hook.event != TAG_CREATED {
            debug!(event = %hook.event, "skip artifactory event");
            return Ok(None);
        }
        let data = hook.data;

        event
            .set(vars::EVENT, hook.event.as_str())
            .set(vars::NAMESPACE, data.event.repo_path.repo_key.as_str())
            .set(vars::NAME, data.docker.image.as_str())
            .set(vars::TAG, data.docker.tag.as_str())
            .set(vars::PUSHER, data.event.modified_by.as_str())
            .set(vars::PUSHED_AT, rfc3339_from_unix_millis(data.event.created));

        let uri = EventUri::build(
            Provider::JFrog,
            data.event.repo_path.repo_key,
            data.docker.image,
            query.account.as_str(),
        );
        debug!(event_uri = %uri, "artifactory docker tag created");
        Ok(Some(Normalized { uri, event }))
    }
}
