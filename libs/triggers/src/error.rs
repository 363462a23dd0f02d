use thiserror::Error;

use crate::pipeline::PipelineError;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("invalid secret for trigger '{id}'")]
    InvalidSecret { id: String },
    #[error("required fields are empty")]
    MissingFields,
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("failed to decode stored pipeline: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("trigger store failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "redis-store")]
impl From<redis::RedisError> for TriggerError {
    fn from(err: redis::RedisError) -> Self {
        TriggerError::Backend(Box::new(err))
    }
}
