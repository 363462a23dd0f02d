use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Well-known keys of [`NormalizedEvent::variables`].
pub mod vars {
    pub const NAMESPACE: &str = "namespace";
    pub const NAME: &str = "name";
    pub const EVENT: &str = "event";
    pub const TAG: &str = "tag";
    pub const PUSHER: &str = "pusher";
    pub const PUSHED_AT: &str = "pushed_at";
    pub const URL: &str = "url";
    pub const PROVIDER: &str = "provider";
    pub const TYPE: &str = "type";
}

/// Failure to bind an inbound webhook body, or to re-serialise it for auditing.
#[derive(Debug, Error)]
pub enum PayloadDecodeError {
    #[error("{0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode original payload: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Provider-agnostic envelope posted to the trigger manager.
///
/// ```
/// use nomios_core::{NormalizedEvent, vars};
///
/// let mut event = NormalizedEvent::new("SECRET");
/// event.set(vars::NAMESPACE, "codefresh");
/// event.set(vars::NAME, "fortune");
///
/// let json = serde_json::to_value(&event).unwrap();
/// assert_eq!(json["secret"], "SECRET");
/// assert_eq!(json["variables"]["name"], "fortune");
/// assert!(json.get("original").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Raw provider payload, kept for audit and debugging.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub original: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

impl NormalizedEvent {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Starts an event whose `original` is the JSON rendering of `payload`.
    pub fn from_payload<T: Serialize>(
        payload: &T,
        secret: impl Into<String>,
    ) -> Result<Self, PayloadDecodeError> {
        let original = serde_json::to_string(payload).map_err(PayloadDecodeError::Encode)?;
        Ok(Self {
            original,
            secret: secret.into(),
            variables: BTreeMap::new(),
        })
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.variables.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }
}
