//! Dispatch of normalized registry events to the trigger manager.
//!
//! [`TriggerClient`] is the seam used by the ingress service. [`HttpTriggerClient`] talks
//! to a real trigger manager, [`DryRunTriggerClient`] only logs and
//! [`InMemoryTriggerClient`] records calls for tests.

mod client;
mod error;
mod memory;

pub use client::{DryRunTriggerClient, HttpTriggerClient, TriggerClient};
pub use error::DispatchError;
pub use memory::InMemoryTriggerClient;

use nomios_core::PipelineRun;

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The trigger manager knows no pipeline for the event.
    NoPipelines,
    Started(Vec<PipelineRun>),
}

impl DispatchOutcome {
    pub fn runs(&self) -> &[PipelineRun] {
        match self {
            DispatchOutcome::NoPipelines => &[],
            DispatchOutcome::Started(runs) => runs,
        }
    }
}
