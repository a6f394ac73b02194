use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error produced by the JSON transforms.
///
/// The `line` field is a best-effort, 1-based line number extracted from the
/// underlying parser diagnostic. It is `None` for errors that have no useful
/// position (blank input, query errors, worker-side failures).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct JsonError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl JsonError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), line: None }
    }

    pub fn with_line(message: impl Into<String>, line: usize) -> Self {
        Self { message: message.into(), line: Some(line) }
    }

    pub fn empty_input() -> Self {
        Self::new("Input is empty")
    }

    pub fn empty_expression() -> Self {
        Self::new("JSONPath expression is empty")
    }
}

impl From<serde_json::Error> for JsonError {
    fn from(err: serde_json::Error) -> Self {
        // serde_json reports line 0 when it has no position to offer.
        match err.line() {
            0 => Self::new(err.to_string()),
            line => Self::with_line(err.to_string(), line),
        }
    }
}

/// Transport-level failure of the background channel.
///
/// These never reach callers of the dispatch-wrapped entry points: the
/// dispatcher converts every one of them into an inline fallback. They are
/// public because the channel client is reusable on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The worker thread could not be created in this environment.
    #[error("worker unavailable: {0}")]
    SpawnFailed(String),
    /// The channel was already poisoned by an earlier fault.
    #[error("worker unavailable")]
    Unavailable,
    /// The worker went away while requests were in flight.
    #[error("worker disconnected")]
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_line() {
        let err = serde_json::from_str::<serde_json::Value>("{\n  \"a\": }").unwrap_err();
        let wrapped = JsonError::from(err);
        assert_eq!(wrapped.line, Some(2));
        assert!(!wrapped.message.is_empty());
    }

    #[test]
    fn fixed_messages() {
        assert_eq!(JsonError::empty_input().to_string(), "Input is empty");
        assert_eq!(JsonError::empty_input().line, None);
    }
}
