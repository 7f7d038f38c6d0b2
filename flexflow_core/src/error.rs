//! Error types for the flexflow_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for flexflow_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad user input (empty name, no steps, ...)
    #[error("{0}")]
    Validation(String),

    /// Share link or token could not be decoded into a plan
    #[error("{0}")]
    MalformedShareLink(String),

    /// No stored plan carries the requested id
    #[error("plan not found: {0}")]
    PlanNotFound(String),

    /// Event not accepted in the session's current phase
    #[error("Session error: {0}")]
    State(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error has a user-facing recovery (message + go back)
    /// rather than being an environment failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::MalformedShareLink(_) | Error::PlanNotFound(_)
        )
    }
}
