use serde::{Deserialize, Serialize};

/// One started pipeline run, as reported by the trigger manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineRun {
    pub fn started(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            error: None,
        }
    }
}

/// Error body returned by the trigger manager for failed calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
    #[serde(default)]
    pub error: String,
}

impl ErrorResponse {
    pub fn new(status: u16, message: impl Into<String>, error: impl ToString) -> Self {
        Self {
            status,
            message: message.into(),
            error: error.to_string(),
        }
    }
}
