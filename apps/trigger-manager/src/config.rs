use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result, anyhow};
use nomios_triggers::StoreConfig;

pub const DEFAULT_BIND: &str = "0.0.0.0:9011";
pub const DEFAULT_CODEFRESH_URL: &str = "https://g.codefresh.io";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerManagerConfig {
    pub addr: SocketAddr,
    pub codefresh_url: String,
    pub codefresh_token: String,
    pub store: StoreConfig,
}

impl TriggerManagerConfig {
    pub fn from_env() -> Result<Self> {
        let addr = env::var("BIND")
            .unwrap_or_else(|_| DEFAULT_BIND.into())
            .parse()
            .context("invalid BIND address")?;
        let store = StoreConfig::from_env()
            .map_err(|err| anyhow!(err))
            .context("invalid trigger store settings")?;
        Ok(Self {
            addr,
            codefresh_url: env::var("CODEFRESH_URL")
                .unwrap_or_else(|_| DEFAULT_CODEFRESH_URL.into()),
            codefresh_token: env::var("CODEFRESH_TOKEN").unwrap_or_default(),
            store,
        })
    }
}
