//! Handler error types

use std::time::Duration;

use thiserror::Error;

/// Coarse classification used by callers to pick a retry or alerting policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something unusable
    Validation,
    /// The deployment is misconfigured
    Configuration,
    /// A downstream dependency (model, storage) failed
    Dependency,
}

/// Errors that can occur while handling a single invocation
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The event itself is missing or malformed
    #[error("{0}")]
    InvalidEvent(String),

    /// A required argument is missing or has the wrong shape
    #[error("{0}")]
    Validation(String),

    /// Required configuration is absent
    #[error("{0}")]
    Configuration(String),

    /// Building the agent (and its session manager) failed
    #[error("Failed to initialize agent: {0:#}")]
    AgentInit(anyhow::Error),

    /// The agent invocation failed
    #[error("{0:#}")]
    Agent(anyhow::Error),

    /// The model call exceeded the configured deadline
    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),
}

impl HandlerError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        HandlerError::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        HandlerError::Configuration(msg.into())
    }

    /// Wrap an agent failure, keeping any typed error the agent raised itself
    pub fn from_agent(err: anyhow::Error) -> Self {
        match err.downcast::<HandlerError>() {
            Ok(err) => err,
            Err(err) => HandlerError::Agent(err),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            HandlerError::InvalidEvent(_) | HandlerError::Validation(_) => ErrorKind::Validation,
            HandlerError::Configuration(_) => ErrorKind::Configuration,
            HandlerError::AgentInit(_) | HandlerError::Agent(_) | HandlerError::Timeout(_) => {
                ErrorKind::Dependency
            }
        }
    }

    /// Whether retrying the same request could succeed without operator action
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Dependency
    }

    /// Status code placed in the failure envelope
    ///
    /// Only argument validation maps to 400; a malformed event is reported as
    /// a server error, as is everything raised past validation.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::Validation(_) => 400,
            _ => 500,
        }
    }

    /// Error text placed in the failure envelope body
    pub fn client_message(&self) -> String {
        match self {
            HandlerError::Validation(msg) | HandlerError::Configuration(msg) => msg.clone(),
            other => format!("Internal server error: {}", other),
        }
    }
}

/// Result type alias for handler operations
pub type HandlerResult<T> = Result<T, HandlerError>;
