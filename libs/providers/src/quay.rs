use nomios_core::{EventUri, PUSH_EVENT, PayloadDecodeError, Provider, vars};
use serde::Deserialize;
use tracing::debug;

use crate::{Normalized, ProviderKind, WebhookAdapter, WebhookQuery, decode};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Payload {
    name: String,
    namespace: String,
    homepage: String,
    updated_tags: Option<Vec<String>>,
}

/// Quay repository push notifications.
///
/// Quay does not promise a tag per push; the first updated tag is used when there is one.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuayAdapter;

impl WebhookAdapter for QuayAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Quay
    }

    fn normalise(
        &self,
        body: &[u8],
        query: &WebhookQuery,
    ) -> Result<Option<Normalized>, PayloadDecodeError> {
        let (payload, mut event) = decode::<Payload>(body, &query.secret)?;

        event
            .set(vars::NAMESPACE, payload.namespace.as_str())
            .set(vars::NAME, payload.name.as_str())
            .set(vars::EVENT, PUSH_EVENT)
            .set(vars::URL, payload.homepage.as_str())
            .set(vars::PROVIDER, Provider::Quay.as_str())
            .set(vars::TYPE, "registry");
        if let Some(tag) = payload.updated_tags.as_deref().and_then(<[_]>::first) {
            event.set(vars::TAG, tag.as_str());
        }

        let uri = EventUri::build(
            Provider::Quay,
            payload.namespace,
            payload.name,
            query.account.as_str(),
        );
        debug!(event_uri = %uri, "quay push");
        Ok(Some(Normalized { uri, event }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_updated_tag_wins() {
        let body = br#"{"namespace":"codefresh","name":"fortune","updated_tags":["1.0","latest"]}"#;
        let out = QuayAdapter
            .normalise(body, &WebhookQuery::default())
            .unwrap()
            .unwrap();
        assert_eq!(out.event.get(vars::TAG), Some("1.0"));
    }

    #[test]
    fn null_tags_are_tolerated() {
        let body = br#"{"namespace":"codefresh","name":"fortune","updated_tags":null}"#;
        let out = QuayAdapter
            .normalise(body, &WebhookQuery::default())
            .unwrap()
            .unwrap();
        assert_eq!(out.event.get(vars::TAG), None);
    }
}
