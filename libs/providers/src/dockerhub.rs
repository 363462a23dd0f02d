use nomios_core::{EventUri, PayloadDecodeError, Provider, rfc3339_from_unix, vars};
use serde::Deserialize;
use tracing::debug;

use crate::{Normalized, ProviderKind, WebhookAdapter, WebhookQuery, decode};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Payload {
    push_data: PushData,
    repository: Repository,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PushData {
    pushed_at: i64,
    tag: String,
    pusher: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Repository {
    namespace: String,
    name: String,
    repo_name: String,
}

impl Repository {
    /// `name`, or `repo_name` without its `namespace/` prefix.
    fn image_name(&self) -> &str {
        if !self.name.is_empty() {
            return &self.name;
        }
        let prefix = format!("{}/", self.namespace);
        self.repo_name
            .strip_prefix(prefix.as_str())
            .unwrap_or(&self.repo_name)
    }
}

/// Docker Hub repository webhooks. Docker Hub only calls them for pushes.
#[derive(Debug, Default, Clone, Copy)]
pub struct DockerHubAdapter;

impl WebhookAdapter for DockerHubAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::DockerHub
    }

    fn normalise(
        &self,
        body: &[u8],
        query: &WebhookQuery,
    ) -> Result<Option<Normalized>, PayloadDecodeError> {
        let (payload, mut event) = decode::<Payload>(body, &query.secret)?;
        let repo = &payload.repository;
        let name = repo.image_name().to_string();

        event
            .set(vars::NAMESPACE, repo.namespace.as_str())
            .set(vars::NAME, name.as_str())
            .set(vars::TAG, payload.push_data.tag.as_str())
            .set(vars::PUSHER, payload.push_data.pusher.as_str())
            .set(
                vars::PUSHED_AT,
                rfc3339_from_unix(payload.push_data.pushed_at),
            );

        let uri = EventUri::build(
            Provider::DockerHub,
            repo.namespace.as_str(),
            name,
            query.account.as_str(),
        );
        debug!(event_uri = %uri, "docker hub push");
        Ok(Some(Normalized { uri, event }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_repo_name() {
        let body = br#"{"repository":{"namespace":"codefresh","repo_name":"codefresh/fortune"}}"#;
        let out = DockerHubAdapter
            .normalise(body, &WebhookQuery::default())
            .unwrap()
            .unwrap();
        assert_eq!(out.uri.to_string(), "registry:dockerhub:codefresh:fortune:push");
        assert_eq!(out.event.get(vars::NAME), Some("fortune"));
    }
}
