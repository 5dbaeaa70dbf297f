use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewardError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Computation error in {context}: {message}")]
    Computation { context: String, message: String },

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl RewardError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        RewardError::Validation(message.into())
    }

    /// Shorthand for an internal inconsistency tied to a location in the plan.
    pub fn computation(context: impl Into<String>, message: impl Into<String>) -> Self {
        RewardError::Computation {
            context: context.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RewardError>;
