//! Error taxonomy for the status tracker
//!
//! Backend calls report plain error text; everything that leaves this crate
//! is wrapped in [`StatusError`] so callers can tell a failed query (recovered
//! locally) from a failed user command (surfaced to the UI).

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StatusError {
    /// A backend query failed. Recovered by falling back to a safe default.
    #[error("query '{operation}' failed: {message}")]
    Query { operation: String, message: String },

    /// A user-initiated command failed. Surfaced to the presentation layer.
    #[error("{operation} failed for '{target}': {message}")]
    Command {
        operation: String,
        target: String,
        message: String,
    },

    /// A value that would break a state invariant was rejected.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A notification payload could not be decoded.
    #[error("malformed payload on '{channel}': {message}")]
    Payload { channel: String, message: String },

    /// The tracker was torn down; late results are discarded.
    #[error("status tracker has been torn down")]
    TornDown,
}

impl StatusError {
    pub fn query(operation: &str, message: impl Into<String>) -> Self {
        StatusError::Query {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn command(operation: &str, target: &str, message: impl Into<String>) -> Self {
        StatusError::Command {
            operation: operation.to_string(),
            target: target.to_string(),
            message: message.into(),
        }
    }

    /// Text shown in `Local{error}` for a failed command
    pub fn user_message(&self) -> String {
        match self {
            StatusError::Command { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type StatusResult<T> = Result<T, StatusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_display() {
        let err = StatusError::command("select_model", "base.en", "model file missing");
        assert_eq!(
            err.to_string(),
            "select_model failed for 'base.en': model file missing"
        );
        assert_eq!(err.user_message(), "model file missing");
    }

    #[test]
    fn test_query_error_display() {
        let err = StatusError::query("list_models", "backend unavailable");
        assert_eq!(err.to_string(), "query 'list_models' failed: backend unavailable");
    }
}
