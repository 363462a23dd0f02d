use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::{EventFamily, EventUri, InvalidUriError, Provider};

pub const STATUS_ACTIVE: &str = "active";

/// Settings needed to render user-facing event details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventInfoConfig {
    /// Public base URL under which the ingress service is reachable.
    pub public_dns: String,
}

impl EventInfoConfig {
    pub fn new(public_dns: impl Into<String>) -> Self {
        Self {
            public_dns: public_dns.into(),
        }
    }
}

/// Everything an end user needs to wire a registry to an event URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Current event handler status (active, error, not active).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
}

/// Describes `uri` and builds the webhook endpoint a registry should call.
///
/// An unparsable public DNS only leaves the endpoint empty; a malformed URI is an error.
///
/// ```
/// use nomios_core::{EventInfoConfig, event_info};
///
/// let cfg = EventInfoConfig::new("https://public-ip");
/// let info = event_info(&cfg, "registry:dockerhub:codefresh:fortune:push", "123456789").unwrap();
/// assert_eq!(info.description, "Docker Hub codefresh/fortune push event");
/// assert_eq!(info.endpoint, "https://public-ip/nomios/dockerhub?secret=123456789");
/// ```
pub fn event_info(
    config: &EventInfoConfig,
    uri: &str,
    secret: &str,
) -> Result<EventInfo, InvalidUriError> {
    debug!(event_uri = %uri, "get trigger-event info");
    let event = EventUri::parse(uri)
        .inspect_err(|_| warn!(event_uri = %uri, "failed to match event URI"))?;

    let kind = human_kind(&event);
    let endpoint = webhook_endpoint(&config.public_dns, &event, secret).unwrap_or_default();
    let help = match settings_link(&event) {
        Some(link) => format!(
            "{kind} webhooks fire when an image is built in, pushed or a new tag is added to, your repository.\n\n\
             Configure {kind} on {link}\n\n\
             Add following Codefresh {kind} webhook endpoint {endpoint}"
        ),
        None => format!(
            "{kind} webhooks fire when an artifact is pushed to your repository.\n\n\
             Configure a {kind} webhook in the registry settings\n\n\
             Add following Codefresh {kind} webhook endpoint {endpoint}"
        ),
    };

    Ok(EventInfo {
        description: format!("{kind} {}/{} push event", event.namespace, event.name),
        endpoint,
        status: STATUS_ACTIVE.to_string(),
        help,
    })
}

fn human_kind(event: &EventUri) -> String {
    match event.family {
        EventFamily::Registry => event.provider.display_name().to_string(),
        EventFamily::Helm => format!("{} Helm", event.provider.display_name()),
    }
}

fn settings_link(event: &EventUri) -> Option<String> {
    match (event.family, event.provider) {
        (EventFamily::Registry, Provider::DockerHub) => Some(format!(
            "https://hub.docker.com/r/{}/{}/~/settings/webhooks/",
            event.namespace, event.name
        )),
        (EventFamily::Registry, Provider::Quay) => Some(format!(
            "https://quay.io/repository/{}/{}?tab=settings",
            event.namespace, event.name
        )),
        _ => None,
    }
}

fn webhook_endpoint(public_dns: &str, event: &EventUri, secret: &str) -> Option<String> {
    let mut url = match Url::parse(public_dns) {
        Ok(url) => url,
        Err(err) => {
            warn!(error = %err, dns = %public_dns, "failed to parse public dns");
            return None;
        }
    };

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "secret" && k != "account")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.push(("secret".into(), secret.to_string()));
    if event.has_account() {
        pairs.push(("account".into(), event.account.clone()));
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let base_path = match url.path() {
        "/" => String::new(),
        path => path.to_string(),
    };
    url.set_path(&format!("/nomios/{}{}", event.webhook_segment(), base_path));
    url.query_pairs_mut().clear().extend_pairs(pairs);
    Some(url.to_string())
}
