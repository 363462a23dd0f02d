use async_trait::async_trait;
use nomios_core::{ErrorResponse, NormalizedEvent, PipelineRun};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info};
use url::Url;

use crate::{DispatchError, DispatchOutcome};

/// Hands a normalized event to whatever runs the linked pipelines.
#[async_trait]
pub trait TriggerClient: Send + Sync {
    async fn trigger_event(
        &self,
        uri: &str,
        event: &NormalizedEvent,
    ) -> Result<DispatchOutcome, DispatchError>;
}

/// Posts events to `<base>/run/<escaped uri>` on the trigger manager.
///
/// One attempt per event. The optional token is sent verbatim as `Authorization`.
#[derive(Clone)]
pub struct HttpTriggerClient {
    client: Client,
    base: String,
    token: Option<String>,
}

impl HttpTriggerClient {
    pub fn new(base: impl Into<String>, token: Option<String>) -> Result<Self, DispatchError> {
        let base = base.into();
        Url::parse(&base).map_err(|source| DispatchError::InvalidBaseUrl {
            url: base.clone(),
            source,
        })?;
        debug!(trigger_manager = %base, "binding to trigger manager");
        Ok(Self {
            client: Client::new(),
            base: base.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn run_url(&self, uri: &str) -> String {
        format!("{}/run/{}", self.base, urlencoding::encode(uri))
    }
}

#[async_trait]
impl TriggerClient for HttpTriggerClient {
    async fn trigger_event(
        &self,
        uri: &str,
        event: &NormalizedEvent,
    ) -> Result<DispatchOutcome, DispatchError> {
        debug!(
            event_uri = %uri,
            vars = ?event.variables,
            "sending normalized event payload"
        );
        let mut req = self.client.post(self.run_url(uri)).json(event);
        if let Some(token) = &self.token {
            req = req.header("Authorization", token);
        }
        let resp = req.send().await.map_err(|source| {
            error!(event_uri = %uri, error = %source, "failed to invoke trigger manager");
            DispatchError::Transport {
                uri: uri.to_string(),
                source,
            }
        })?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|source| {
            error!(
                event_uri = %uri,
                status = status.as_u16(),
                error = %source,
                "failed to read trigger manager response"
            );
            DispatchError::Transport {
                uri: uri.to_string(),
                source,
            }
        })?;

        if status.as_u16() >= 400 {
            let upstream = serde_json::from_slice::<ErrorResponse>(&body).ok();
            error!(
                event_uri = %uri,
                status = status.as_u16(),
                upstream = ?upstream,
                "trigger manager rejected event"
            );
            return Err(DispatchError::Status {
                status: status.as_u16(),
                status_line: status_line(status),
                uri: uri.to_string(),
                upstream,
            });
        }

        if status == StatusCode::NO_CONTENT || body.is_empty() {
            debug!(event_uri = %uri, "no pipeline linked to the event");
            return Ok(DispatchOutcome::NoPipelines);
        }

        let runs: Vec<PipelineRun> =
            serde_json::from_slice(&body).map_err(|source| DispatchError::Decode {
                uri: uri.to_string(),
                source,
            })?;
        info!(event_uri = %uri, runs = runs.len(), "event successfully triggered");
        Ok(DispatchOutcome::Started(runs))
    }
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

/// Logs events instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct DryRunTriggerClient;

#[async_trait]
impl TriggerClient for DryRunTriggerClient {
    async fn trigger_event(
        &self,
        uri: &str,
        event: &NormalizedEvent,
    ) -> Result<DispatchOutcome, DispatchError> {
        info!(
            event_uri = %uri,
            secret = %event.secret,
            vars = ?event.variables,
            original = %event.original,
            "dry run: trigger event"
        );
        Ok(DispatchOutcome::NoPipelines)
    }
}
