//! Canonical event addresses.
//!
//! Every registry push is named by a colon-delimited URI:
//!
//! ```text
//! registry:<provider>:<namespace>:<name>:push[:<account>]
//! helm:jfrog:<namespace>:<name>:push[:<account>]
//! ```
//!
//! The URI is the join key between an inbound webhook and the stored trigger
//! subscriptions, so building it must be deterministic and parsing must reject
//! anything outside the grammar.

use std::{fmt, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only event kind currently modeled.
pub const PUSH_EVENT: &str = "push";

/// Raised when a string does not match the event URI grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected event uri: {uri}")]
pub struct InvalidUriError {
    pub uri: String,
}

impl InvalidUriError {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

/// Leading URI segment: what kind of artifact was pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFamily {
    Registry,
    Helm,
}

impl EventFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventFamily::Registry => "registry",
            EventFamily::Helm => "helm",
        }
    }
}

impl FromStr for EventFamily {
    type Err = InvalidUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registry" => Ok(EventFamily::Registry),
            "helm" => Ok(EventFamily::Helm),
            other => Err(InvalidUriError::new(other)),
        }
    }
}

/// Registry providers that can emit push webhooks.
///
/// ```
/// use nomios_core::Provider;
///
/// assert_eq!(Provider::DockerHub.as_str(), "dockerhub");
/// assert_eq!("quay".parse::<Provider>().unwrap(), Provider::Quay);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    DockerHub,
    Quay,
    JFrog,
    Azure,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::DockerHub,
        Provider::Quay,
        Provider::JFrog,
        Provider::Azure,
    ];

    /// Lowercase token used in event URIs and webhook routes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::DockerHub => "dockerhub",
            Provider::Quay => "quay",
            Provider::JFrog => "jfrog",
            Provider::Azure => "azure",
        }
    }

    /// Human readable registry name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::DockerHub => "Docker Hub",
            Provider::Quay => "Quay",
            Provider::JFrog => "JFrog Artifactory",
            Provider::Azure => "Azure Container Registry",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = InvalidUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| InvalidUriError::new(s))
    }
}

/// Route segment under `/nomios/` that receives webhooks for a family/provider pair.
pub fn webhook_segment(family: EventFamily, provider: Provider) -> &'static str {
    match (family, provider) {
        (EventFamily::Helm, Provider::JFrog) => "jfrog-helm",
        (_, provider) => provider.as_str(),
    }
}

fn provider_alternation() -> String {
    Provider::ALL
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

static REGISTRY_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^registry:({}):([a-z0-9_-]+):([a-z0-9_-]+):push(?::([[:xdigit:]]{{12}}))?$",
        provider_alternation()
    ))
    .expect("registry event uri pattern must compile")
});

// chart archive names carry a version, so dots are allowed in the name segment
static HELM_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^helm:(jfrog):([a-z0-9_-]+):([a-z0-9._-]+):push(?::([[:xdigit:]]{12}))?$")
        .expect("helm event uri pattern must compile")
});

/// Returns `true` when `uri` matches the event URI grammar.
///
/// ```
/// use nomios_core::validate;
///
/// assert!(validate("registry:dockerhub:codefresh:fortune:push"));
/// assert!(validate("registry:quay:codefresh:fortune:push:cb1e73c5215b"));
/// assert!(!validate("registry:dockerhub:codefresh:fortune:pull"));
/// ```
pub fn validate(uri: &str) -> bool {
    REGISTRY_URI.is_match(uri) || HELM_URI.is_match(uri)
}

/// Parsed (or freshly built) event address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventUri {
    pub family: EventFamily,
    pub provider: Provider,
    pub namespace: String,
    pub name: String,
    /// Empty when the URI carries no account qualifier.
    pub account: String,
}

impl EventUri {
    /// Builds a `registry:` URI. Segments are used verbatim.
    ///
    /// ```
    /// use nomios_core::{EventUri, Provider};
    ///
    /// let uri = EventUri::build(Provider::DockerHub, "codefresh", "fortune", "");
    /// assert_eq!(uri.to_string(), "registry:dockerhub:codefresh:fortune:push");
    /// ```
    pub fn build(
        provider: Provider,
        namespace: impl Into<String>,
        name: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self::build_in(EventFamily::Registry, provider, namespace, name, account)
    }

    pub fn build_in(
        family: EventFamily,
        provider: Provider,
        namespace: impl Into<String>,
        name: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            family,
            provider,
            namespace: namespace.into(),
            name: name.into(),
            account: account.into(),
        }
    }

    /// Parses and validates a URI string.
    pub fn parse(uri: &str) -> Result<Self, InvalidUriError> {
        let caps = REGISTRY_URI
            .captures(uri)
            .or_else(|| HELM_URI.captures(uri))
            .ok_or_else(|| InvalidUriError::new(uri))?;

        // the grammar is anchored, so the family is whatever precedes the first colon
        let family = uri
            .split(':')
            .next()
            .unwrap_or_default()
            .parse::<EventFamily>()
            .map_err(|_| InvalidUriError::new(uri))?;
        let provider = caps[1]
            .parse::<Provider>()
            .map_err(|_| InvalidUriError::new(uri))?;

        Ok(Self {
            family,
            provider,
            namespace: caps[2].to_string(),
            name: caps[3].to_string(),
            account: caps
                .get(4)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        })
    }

    /// Checks the rendered URI against the grammar.
    pub fn validate(&self) -> Result<(), InvalidUriError> {
        let rendered = self.to_string();
        if validate(&rendered) {
            Ok(())
        } else {
            Err(InvalidUriError::new(rendered))
        }
    }

    pub fn has_account(&self) -> bool {
        !self.account.is_empty()
    }

    pub fn webhook_segment(&self) -> &'static str {
        webhook_segment(self.family, self.provider)
    }
}

impl fmt::Display for EventUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.family.as_str(),
            self.provider.as_str(),
            self.namespace,
            self.name,
            PUSH_EVENT
        )?;
        if self.has_account() {
            write!(f, ":{}", self.account)?;
        }
        Ok(())
    }
}

impl FromStr for EventUri {
    type Err = InvalidUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventUri::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_without_account() {
        for provider in Provider::ALL {
            let built = EventUri::build(provider, "codefresh", "fortune", "");
            let parsed = EventUri::parse(&built.to_string()).expect("valid uri");
            assert_eq!(parsed, built);
            assert_eq!(parsed.account, "");
            assert_eq!(built.to_string().split(':').count(), 5);
        }
    }

    #[test]
    fn round_trips_with_account() {
        let built = EventUri::build(Provider::Quay, "namespace", "name", "cb1e73c5215b");
        let rendered = built.to_string();
        assert_eq!(rendered, "registry:quay:namespace:name:push:cb1e73c5215b");
        assert_eq!(rendered.split(':').count(), 6);
        let parsed: EventUri = rendered.parse().expect("valid uri");
        assert_eq!(parsed, built);
    }

    #[test]
    fn equal_events_render_identically() {
        let a = EventUri::build(Provider::JFrog, "local", "test", "cb1e73c5215b");
        let b = EventUri::build(Provider::JFrog, "local", "test", "cb1e73c5215b");
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn build_does_not_normalise() {
        let uri = EventUri::build(Provider::DockerHub, "CodeFresh", "Fortune", "");
        assert_eq!(uri.to_string(), "registry:dockerhub:CodeFresh:Fortune:push");
        assert!(uri.validate().is_err());
    }

    #[test]
    fn rejects_malformed_uris() {
        let bad = [
            "registry:dockerhub:codefresh:fortune:pull",
            "registry:dockerhub:unexpected-format:push",
            "registry:dockerhub:codefresh:fortune",
            "registry:dockerhub:codefresh:fortune:push:cb1e73c5215",
            "registry:dockerhub:codefresh:fortune:push:cb1e73c5215bb",
            "registry:dockerhub:codefresh:fortune:push:zz1e73c5215b",
            "registry:dockerhub:codefresh:fortune:push:cb1e73c5215b:extra",
            "registry:gcr:codefresh:fortune:push",
            "index.docker.io:codefresh:fortune:push",
            "registry:dockerhub::fortune:push",
            "",
        ];
        for uri in bad {
            assert!(!validate(uri), "{uri} should be rejected");
            assert_eq!(EventUri::parse(uri), Err(InvalidUriError::new(uri)));
        }
    }

    #[test]
    fn helm_family_parses() {
        let uri = EventUri::parse("helm:jfrog:charts:mychart-0.1.0.tgz:push").expect("helm uri");
        assert_eq!(uri.family, EventFamily::Helm);
        assert_eq!(uri.provider, Provider::JFrog);
        assert_eq!(uri.name, "mychart-0.1.0.tgz");
        assert_eq!(uri.webhook_segment(), "jfrog-helm");
        assert!(!validate("helm:quay:charts:mychart:push"));
        assert!(!validate("registry:jfrog:charts:mychart-0.1.0.tgz:push"));
    }
}
