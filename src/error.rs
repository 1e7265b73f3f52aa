use simple_error::SimpleError;

use crate::types::Step;

pub type GlifResult<T> = Result<T, GlifError>;

#[derive(Debug, thiserror::Error)]
pub enum GlifError {
    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] SimpleError),

    #[error("unknown channel {channel} (neuron has {num_channels} channels)")]
    UnknownChannel { channel: usize, num_channels: usize },

    #[error("unknown recordable: {0}")]
    UnknownRecordable(String),

    #[error("delivery step {delivery} not within (now = {now}, now + {horizon}]")]
    InvalidDelivery {
        delivery: Step,
        now: Step,
        horizon: usize,
    },

    #[error("update must start at step {expected}, got {got}")]
    StepOutOfSync { expected: Step, got: Step },

    #[error("numerical integration failed at step {step}: {reason}")]
    SolverFailure { step: Step, reason: String },

    #[error("malformed configuration: {0}")]
    Deserialize(String),
}

impl From<serde_json::Error> for GlifError {
    fn from(err: serde_json::Error) -> Self {
        GlifError::Deserialize(err.to_string())
    }
}

impl From<serde_yaml::Error> for GlifError {
    fn from(err: serde_yaml::Error) -> Self {
        GlifError::Deserialize(err.to_string())
    }
}
