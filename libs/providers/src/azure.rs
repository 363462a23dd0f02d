use nomios_core::{EventUri, PUSH_EVENT, PayloadDecodeError, Provider, vars};
use serde::Deserialize;
use tracing::debug;

use crate::{Normalized, ProviderKind, WebhookAdapter, WebhookQuery, decode};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Payload {
    action: String,
    timestamp: String,
    target: Target,
    request: Request,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Target {
    repository: String,
    tag: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Request {
    host: String,
}

/// Image name from `<namespace>/<path...>`: the first segment is dropped and the rest
/// concatenated. A repository without `/` is used as is.
fn image_name(repository: &str) -> String {
    match repository.split_once('/') {
        Some((_, rest)) => rest.split('/').collect(),
        None => repository.to_string(),
    }
}

/// Azure Container Registry webhooks; only the `push` action is dispatched.
#[derive(Debug, Default, Clone, Copy)]
pub struct AzureAdapter;

impl WebhookAdapter for AzureAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Azure
    }

    fn normalise(
        &self,
        body: &[u8],
        query: &WebhookQuery,
    ) -> Result<Option<Normalized>, PayloadDecodeError> {
        let (payload, mut event) = decode::<Payload>(body, &query.secret)?;
        if payload.action != PUSH_EVENT {
            debug!(action = %payload.action, "skip azure event");
            return Ok(None);
        }

        // registry name, e.g. `myregistry` of `myregistry.azurecr.io`
        let namespace = payload
            .request
            .host
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string();
        let name = image_name(&payload.target.repository);

        event
            .set(vars::EVENT, payload.action.as_str())
            .set(vars::NAMESPACE, namespace.as_str())
            .set(vars::NAME, name.as_str())
            .set(vars::TAG, payload.target.tag.as_str())
            .set(vars::PUSHED_AT, payload.timestamp.as_str());

        let uri = EventUri::build(Provider::Azure, namespace, name, query.account.as_str());
        debug!(event_uri = %uri, "azure push");
        Ok(Some(Normalized { uri, event }))
    }
}
