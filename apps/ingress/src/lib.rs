//! Webhook ingress for container registries.
//!
//! Receives registry push notifications, turns them into normalized events and hands
//! them to the trigger manager. Also serves event details for the UI and the usual
//! health/version endpoints.

pub mod cli;
pub mod config;
pub mod http;
mod reqid;

use std::sync::Arc;

use anyhow::Result;
use nomios_dispatch::{DryRunTriggerClient, HttpTriggerClient, TriggerClient};
use tracing::info;

pub use reqid::{REQUEST_ID, RequestId};

use crate::config::IngressConfig;
use crate::http::AppState;

/// Picks the dispatch client for `config`.
pub fn trigger_client(config: &IngressConfig) -> Result<Arc<dyn TriggerClient>> {
    if config.dry_run {
        info!("dry run: events are logged, not sent");
        return Ok(Arc::new(DryRunTriggerClient));
    }
    let client = HttpTriggerClient::new(config.trigger_manager.as_str(), config.token.clone())?;
    Ok(Arc::new(client))
}

pub fn app_state(config: &IngressConfig) -> Result<AppState> {
    Ok(AppState::new(
        trigger_client(config)?,
        config.event_info.clone(),
    ))
}
