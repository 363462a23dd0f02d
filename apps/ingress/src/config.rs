use std::net::{Ipv4Addr, SocketAddr};

use anyhow::{Context, Result};
use nomios_core::EventInfoConfig;

use crate::cli::ServerArgs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressConfig {
    pub addr: SocketAddr,
    /// Trigger manager base URL, always with a scheme.
    pub trigger_manager: String,
    pub token: Option<String>,
    pub event_info: EventInfoConfig,
    pub dry_run: bool,
}

impl IngressConfig {
    pub fn from_args(args: &ServerArgs) -> Result<Self> {
        let trigger_manager = with_scheme(args.hermes.trim());
        if !args.dry_run {
            anyhow::ensure!(
                !args.hermes.trim().is_empty(),
                "trigger manager address is required unless --dry-run is set"
            );
            url_check(&trigger_manager)
                .with_context(|| format!("invalid trigger manager address '{}'", args.hermes))?;
        }
        Ok(Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, args.port)),
            trigger_manager,
            token: Some(args.token.clone()).filter(|t| !t.is_empty()),
            event_info: EventInfoConfig::new(args.dns.as_str()),
            dry_run: args.dry_run,
        })
    }
}

/// Prefixes `http://` unless the address already names `http` or `https`.
pub fn with_scheme(addr: &str) -> String {
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    }
}

fn url_check(addr: &str) -> Result<()> {
    let rest = addr
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or_default();
    anyhow::ensure!(!rest.is_empty(), "missing host");
    Ok(())
}
