/// Labels attached to webhook counters.
///
/// Only low-cardinality values belong here; per-event data such as the event URI is
/// recorded on spans instead (see [`with_common_fields`](crate::with_common_fields)).
#[derive(Debug, Clone, Default)]
pub struct TelemetryLabels {
    pub provider: String,
    pub extra: Vec<(String, String)>,
}

impl TelemetryLabels {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Self::default()
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    pub fn tags(&self) -> Vec<(String, String)> {
        let mut tags = Vec::with_capacity(1 + self.extra.len());
        tags.push(("provider".into(), self.provider.clone()));
        tags.extend(self.extra.iter().cloned());
        tags
    }
}
