use nomios_core::{
    EventFamily, EventUri, PayloadDecodeError, Provider, rfc3339_from_unix_millis, vars,
};
use serde::Deserialize;
use tracing::debug;

use crate::{Normalized, ProviderKind, WebhookAdapter, WebhookQuery, decode};

pub(crate) const AFTER_CREATE: &str = "storage.afterCreate";

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
#[serde(default, rename_all = "camelCase")]
struct Data {
    modified_by: String,
    created: i64,
    repo_path: RepoPath,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RepoPath {
    repo_key: String,
    name: String,
}

/// Artifactory helm repository webhooks, addressed in the `helm:` family.
#[derive(Debug, Default, Clone, Copy)]
pub struct JFrogHelmAdapter;

impl WebhookAdapter for JFrogHelmAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::JFrogHelm
    }

    fn normalise(
        &self,
        body: &[u8],
        query: &WebhookQuery,
    ) -> Result<Option<Normalized>, PayloadDecodeError> {
        let (payload, mut event) = decode::<Payload>(body, &query.secret)?;
        let hook = payload.artifactory.webhook;
        if hook.event != AFTER_CREATE {
            debug!(event = %hook.event, "skip artifactory helm event");
            return Ok(None);
        }
        let data = hook.data;

        event
            .set(vars::EVENT, hook.event.as_str())
            .set(vars::NAMESPACE, data.repo_path.repo_key.as_str())
            .set(vars::NAME, data.repo_path.name.as_str())
            .set(vars::PUSHER, data.modified_by.as_str())
            .set(vars::PUSHED_AT, rfc3339_from_unix_millis(data.created));

        let uri = EventUri::build_in(
            EventFamily::Helm,
            Provider::JFrog,
            data.repo_path.repo_key,
            data.repo_path.name,
            query.account.as_str(),
        );
        debug!(event_uri = %uri, "artifactory chart stored");
        Ok(Some(Normalized { uri, event }))
    }
}
