//! Registry webhook adapters.
//!
//! Every supported registry implements [`WebhookAdapter`]: it decodes the provider
//! payload, drops event kinds other than a push, and produces the event URI plus the
//! [`NormalizedEvent`] handed to the trigger manager. [`ingest`] ties an adapter to a
//! [`TriggerClient`].

mod azure;
mod dockerhub;
mod ingest;
mod jfrog;
mod jfrog_helm;
mod quay;

use std::fmt;
use std::str::FromStr;

use nomios_core::{EventUri, NormalizedEvent, PayloadDecodeError};
use serde::Deserialize;
use serde::de::DeserializeOwned;

pub use azure::AzureAdapter;
pub use dockerhub::DockerHubAdapter;
pub use ingest::{IngestError, IngestOutcome, ingest};
pub use jfrog::JFrogAdapter;
pub use jfrog_helm::JFrogHelmAdapter;
pub use quay::QuayAdapter;

/// Webhook flavours accepted by the ingress, named after their route segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    DockerHub,
    Quay,
    JFrog,
    JFrogHelm,
    Azure,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::DockerHub,
        ProviderKind::Quay,
        ProviderKind::JFrog,
        ProviderKind::JFrogHelm,
        ProviderKind::Azure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::DockerHub => "dockerhub",
            ProviderKind::Quay => "quay",
            ProviderKind::JFrog => "jfrog",
            ProviderKind::JFrogHelm => "jfrog-helm",
            ProviderKind::Azure => "azure",
        }
    }

    pub fn adapter(&self) -> Box<dyn WebhookAdapter> {
        match self {
            ProviderKind::DockerHub => Box::new(DockerHubAdapter),
            ProviderKind::Quay => Box::new(QuayAdapter),
            ProviderKind::JFrog => Box::new(JFrogAdapter),
            ProviderKind::JFrogHelm => Box::new(JFrogHelmAdapter),
            ProviderKind::Azure => Box::new(AzureAdapter),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown webhook provider '{s}'"))
    }
}

/// Query string of an inbound webhook call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WebhookQuery {
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub account: String,
}

impl WebhookQuery {
    pub fn new(secret: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            account: account.into(),
        }
    }
}

/// An event ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub uri: EventUri,
    pub event: NormalizedEvent,
}

pub trait WebhookAdapter: Send + Sync {
    fn provider(&self) -> ProviderKind;

    /// Turns a raw webhook body into an event, or `None` for event kinds that are skipped.
    fn normalise(
        &self,
        body: &[u8],
        query: &WebhookQuery,
    ) -> Result<Option<Normalized>, PayloadDecodeError>;
}

/// Decodes `body` both as a generic JSON document, kept as the event's `original`, and as
/// the adapter's typed view of it.
pub(crate) fn decode<T: DeserializeOwned>(
    body: &[u8],
    secret: &str,
) -> Result<(T, NormalizedEvent), PayloadDecodeError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(PayloadDecodeError::Decode)?;
    let payload = T::deserialize(&value).map_err(PayloadDecodeError::Decode)?;
    let event = NormalizedEvent::from_payload(&value, secret)?;
    Ok((payload, event))
}
