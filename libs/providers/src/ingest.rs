use nomios_core::{EventUri, InvalidUriError, PayloadDecodeError};
use nomios_dispatch::{DispatchError, DispatchOutcome, TriggerClient};
use nomios_telemetry::{
    DISPATCH_FAILURES, EVENTS_DISPATCHED, TelemetryLabels, WEBHOOKS_RECEIVED, WEBHOOKS_SKIPPED,
    record_counter, with_common_fields,
};
use thiserror::Error;
use tracing::{Span, debug, error, field::Empty, info, instrument};

use crate::{WebhookAdapter, WebhookQuery};

/// Everything that turns a webhook call into a 400 for the registry.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Payload(#[from] PayloadDecodeError),
    #[error(transparent)]
    InvalidUri(#[from] InvalidUriError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The payload was an event kind that is not dispatched.
    Skipped,
    Dispatched {
        uri: EventUri,
        outcome: DispatchOutcome,
    },
}

/// Normalises `body` with `adapter` and dispatches the result once.
#[instrument(name = "webhook", skip_all, fields(provider = Empty, event_uri = Empty))]
pub async fn ingest(
    adapter: &dyn WebhookAdapter,
    client: &dyn TriggerClient,
    body: &[u8],
    query: &WebhookQuery,
) -> Result<IngestOutcome, IngestError> {
    let provider = adapter.provider();
    let span = Span::current();
    with_common_fields(&span, provider.as_str(), None);
    let labels = TelemetryLabels::new(provider.as_str());
    record_counter(WEBHOOKS_RECEIVED, 1, &labels);

    let normalized = match adapter.normalise(body, query) {
        Ok(Some(normalized)) => normalized,
        Ok(None) => {
            record_counter(WEBHOOKS_SKIPPED, 1, &labels);
            return Ok(IngestOutcome::Skipped);
        }
        Err(err) => {
            error!(provider = %provider, error = %err, "failed to decode webhook payload");
            return Err(err.into());
        }
    };

    normalized.uri.validate().inspect_err(|err| {
        error!(provider = %provider, error = %err, "webhook produced an invalid event uri")
    })?;
    let uri = normalized.uri.to_string();
    with_common_fields(&span, provider.as_str(), Some(uri.as_str()));
    debug!(provider = %provider, event_uri = %uri, "dispatching event");

    match client.trigger_event(&uri, &normalized.event).await {
        Ok(outcome) => {
            record_counter(EVENTS_DISPATCHED, 1, &labels);
            info!(
                provider = %provider,
                event_uri = %uri,
                runs = outcome.runs().len(),
                "event dispatched"
            );
            Ok(IngestOutcome::Dispatched {
                uri: normalized.uri,
                outcome,
            })
        }
        Err(err) => {
            record_counter(DISPATCH_FAILURES, 1, &labels);
            error!(provider = %provider, event_uri = %uri, error = %err, "failed to trigger event pipelines");
            Err(err.into())
        }
    }
}
