use clap::{Args, Parser, Subcommand};
use nomios_telemetry::TelemetryConfig;

pub const DEFAULT_PUBLIC_DNS: &str = "https://g.codefresh.io";

#[derive(Parser, Debug)]
#[command(
    name = "nomios",
    author,
    version,
    about = "Registry webhook ingress for Codefresh triggers"
)]
pub struct Cli {
    /// Log level: debug, info, warning, error, fatal, panic. `RUST_LOG` applies when unset
    #[arg(long, global = true, env = "LOG_LEVEL")]
    pub log_level: Option<String>,
    /// Emit JSON logs
    #[arg(long, global = true, env = "LOG_JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Telemetry settings from the environment, overridden by `--log-level` and `--json`.
    pub fn telemetry(&self) -> TelemetryConfig {
        let mut telemetry = TelemetryConfig::from_env("nomios", env!("CARGO_PKG_VERSION"));
        if let Some(level) = &self.log_level {
            telemetry = telemetry.with_log_level(level);
        }
        if self.json {
            telemetry = telemetry.with_json_logs(true);
        }
        telemetry
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the webhook server
    Server(ServerArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServerArgs {
    /// Trigger manager address
    #[arg(long, env = "HERMES_SERVICE", default_value = "hermes")]
    pub hermes: String,
    /// Token sent to the trigger manager
    #[arg(long, env = "HERMES_TOKEN", default_value = "")]
    pub token: String,
    /// Public URL of this service, used in event details
    #[arg(long, env = "PUBLIC_DNS_NAME", default_value = DEFAULT_PUBLIC_DNS)]
    pub dns: String,
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 10001)]
    pub port: u16,
    /// Log events instead of sending them
    #[arg(long)]
    pub dry_run: bool,
}
