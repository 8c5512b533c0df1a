use serde::{Deserialize, Serialize};

use crate::job::JobState;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// No terminal state was observed within the polling budget.
    /// `last_transient` keeps the most recent transport failure, if any,
    /// so a sustained outage can be told apart in the logs.
    #[error("Job did not finish within {budget_secs}s{}", last_transient_suffix(.last_transient))]
    Timeout {
        budget_secs: u64,
        last_transient: Option<String>,
    },

    #[error("Job failed on the service side (code {code}): {message}")]
    JobFailed { code: i64, message: String },

    #[error("Artifact {index} could not be materialized: {message}")]
    Materialization { index: usize, message: String },

    #[error("Invalid job state transition: {from} -> {to}")]
    InvalidTransition { from: JobState, to: JobState },

    #[error("Cancelled before completion")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn last_transient_suffix(last: &Option<String>) -> String {
    match last {
        Some(cause) => format!(" (last transient error: {cause})"),
        None => String::new(),
    }
}

impl CoreError {
    /// Whether a poll loop may retry after this error.
    ///
    /// Only transport failures are transient; everything else either
    /// ends the job or aborts the item.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// The pipeline stage an item failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Reading the source image, selecting a scenario, building the request.
    Composition,
    /// Sending the request to the video service.
    Submission,
    /// Waiting for the job to reach a terminal state.
    Polling,
    /// Writing artifacts to local files.
    Materialization,
    /// The run was aborted before this item started.
    Cancelled,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Composition => "composition",
            Self::Submission => "submission",
            Self::Polling => "polling",
            Self::Materialization => "materialization",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_includes_last_transient_cause() {
        let err = CoreError::Timeout {
            budget_secs: 600,
            last_transient: Some("connection reset".into()),
        };
        assert_eq!(
            err.to_string(),
            "Job did not finish within 600s (last transient error: connection reset)"
        );
    }

    #[test]
    fn timeout_message_without_cause() {
        let err = CoreError::Timeout {
            budget_secs: 30,
            last_transient: None,
        };
        assert_eq!(err.to_string(), "Job did not finish within 30s");
    }

    #[test]
    fn only_transport_is_transient() {
        assert!(CoreError::Transport("reset".into()).is_transient());
        assert!(!CoreError::Auth("expired".into()).is_transient());
        assert!(!CoreError::Validation("gif".into()).is_transient());
        assert!(!CoreError::JobFailed {
            code: 3,
            message: "blocked".into()
        }
        .is_transient());
    }

    #[test]
    fn stage_serializes_snake_case() {
        let json = serde_json::to_string(&Stage::Materialization).unwrap();
        assert_eq!(json, "\"materialization\"");
        assert_eq!(Stage::Submission.to_string(), "submission");
    }
}
