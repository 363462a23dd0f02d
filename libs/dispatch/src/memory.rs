use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nomios_core::{NormalizedEvent, PipelineRun};

use crate::{DispatchError, DispatchOutcome, TriggerClient};

/// Records every dispatched event; optionally fails with a scripted status.
#[derive(Clone, Default)]
pub struct InMemoryTriggerClient {
    calls: Arc<Mutex<Vec<(String, NormalizedEvent)>>>,
    fail_with: Option<u16>,
}

impl InMemoryTriggerClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call answers with `status` as if the trigger manager had rejected it.
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, NormalizedEvent)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TriggerClient for InMemoryTriggerClient {
    async fn trigger_event(
        &self,
        uri: &str,
        event: &NormalizedEvent,
    ) -> Result<DispatchOutcome, DispatchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((uri.to_string(), event.clone()));
        }
        match self.fail_with {
            Some(status) => Err(DispatchError::Status {
                status,
                status_line: status.to_string(),
                uri: uri.to_string(),
                upstream: None,
            }),
            None => Ok(DispatchOutcome::Started(vec![PipelineRun::started(format!(
                "run-{}",
                self.calls().len()
            ))])),
        }
    }
}
