use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryProtocol {
    Grpc,
    HttpProtobuf,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub endpoint: String,
    pub protocol: TelemetryProtocol,
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    pub json_logs: bool,
    /// Overrides `RUST_LOG` when set (e.g. from a `--log-level` flag).
    pub log_level: Option<String>,
    pub enabled: bool,
}

impl TelemetryProtocol {
    fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "http" | "http/protobuf" => TelemetryProtocol::HttpProtobuf,
            _ => TelemetryProtocol::Grpc,
        }
    }
}

impl TelemetryConfig {
    /// Reads the process environment; see [`TelemetryConfig::from_lookup`].
    pub fn from_env(service_name: &str, service_version: &str) -> Self {
        Self::from_lookup(service_name, service_version, |key| env::var(key).ok())
    }

    /// Builds the config from `lookup`, which resolves environment variable names.
    ///
    /// Logs are JSON when `LOG_JSON` is truthy (the ingress `--json` flag reads the same
    /// variable) or, if `LOG_JSON` is unset, when `LOG_FORMAT=json`. OTLP export needs
    /// `ENABLE_OTEL` and `OTEL_EXPORTER_OTLP_ENDPOINT`.
    pub fn from_lookup(
        service_name: &str,
        service_version: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
            .map(|e| e.trim().to_string())
            .unwrap_or_default();
        let environment = lookup("NOMIOS_ENV")
            .or_else(|| {
                lookup("OTEL_RESOURCE_ATTRIBUTES")
                    .and_then(|attrs| resource_attribute(&attrs, "deployment.environment"))
            })
            .unwrap_or_else(|| "dev".into());
        let json_logs = match lookup("LOG_JSON").as_deref().and_then(flag) {
            Some(json) => json,
            None => lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
        };
        let enabled = lookup("ENABLE_OTEL").as_deref().and_then(flag).unwrap_or(false)
            && !endpoint.is_empty();

        Self {
            protocol: lookup("OTEL_EXPORTER_OTLP_PROTOCOL")
                .map(|p| TelemetryProtocol::from_name(&p))
                .unwrap_or(TelemetryProtocol::Grpc),
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or_else(|| service_name.into()),
            service_version: service_version.into(),
            endpoint,
            environment,
            json_logs,
            log_level: None,
            enabled,
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    pub fn exporter_enabled(&self) -> bool {
        self.enabled && !self.endpoint.trim().is_empty()
    }

    /// Filter directive handed to `EnvFilter` when a level was given explicitly.
    ///
    /// Accepts the level names of the old CLI (`warning`, `fatal`, `panic`) besides the
    /// `tracing` ones.
    pub fn filter_directive(&self) -> Option<String> {
        self.log_level.as_deref().map(|level| {
            match level.to_lowercase().as_str() {
                "debug" => "debug",
                "info" => "info",
                "warning" | "warn" => "warn",
                "error" | "fatal" | "panic" => "error",
                "trace" => "trace",
                _ => "warn",
            }
            .to_string()
        })
    }
}

/// Parses a boolean-ish environment value; anything unrecognised is `None`.
fn flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Value of `key` in an OTel `k=v,k=v` resource attribute list.
fn resource_attribute(attrs: &str, key: &str) -> Option<String> {
    attrs.split(',').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k.trim() == key).then(|| v.trim().to_string())
    })
}
