use serde::{Deserialize, Serialize};

/// A pipeline started when the owning trigger fires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    #[serde(rename = "repo-owner")]
    pub repo_owner: String,
    #[serde(rename = "repo-name")]
    pub repo_name: String,
}

impl Pipeline {
    pub fn new(
        name: impl Into<String>,
        repo_owner: impl Into<String>,
        repo_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            repo_owner: repo_owner.into(),
            repo_name: repo_name.into(),
        }
    }
}

/// Links an event URI to the pipelines it starts.
///
/// Pipelines keep their insertion order and may repeat. The default value doubles as the
/// "not found" answer of [`TriggerStore::get`](crate::TriggerStore::get).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub pipelines: Vec<Pipeline>,
}

impl Trigger {
    pub const EMPTY: Trigger = Trigger {
        event: String::new(),
        secret: String::new(),
        pipelines: Vec::new(),
    };

    pub fn new(event: impl Into<String>, secret: impl Into<String>, pipelines: Vec<Pipeline>) -> Self {
        Self {
            event: event.into(),
            secret: secret.into(),
            pipelines,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Whether the trigger carries what `add` needs: an event and one pipeline or more.
    pub fn has_required_fields(&self) -> bool {
        !self.event.is_empty() && !self.pipelines.is_empty()
    }
}
