//! Job lifecycle state machine.
//!
//! A [`Job`] tracks one long-running generation operation from
//! submission to a terminal state. Transitions only move forward:
//!
//! ```text
//! PENDING -> RUNNING -> DONE | FAILED     (reported by the service)
//! PENDING | RUNNING  -> TIMEOUT           (decided by the client)
//! ```
//!
//! Once a terminal state is reached the job never leaves it.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle state of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Submitted, no status observed yet.
    Pending,
    /// The service reported the operation as not done.
    Running,
    /// The service reported completion with a response payload.
    Done,
    /// The service reported completion with an error payload.
    Failed,
    /// The client gave up waiting.
    Timeout,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Timeout)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Done | Self::Failed | Self::Timeout => 2,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Staying in a non-terminal state is allowed (a poll that reports
    /// "still running" twice); everything else must strictly advance.
    pub fn can_transition_to(self, next: JobState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if self == next {
            return true;
        }
        next.rank() > self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Handle + job
// ---------------------------------------------------------------------------

/// Opaque, service-assigned identifier of a long-running operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A submitted job and its current lifecycle state.
#[derive(Debug, Clone)]
pub struct Job {
    handle: JobHandle,
    submitted_at: Timestamp,
    state: JobState,
}

impl Job {
    /// A freshly submitted job in the `PENDING` state.
    pub fn submitted(handle: JobHandle) -> Self {
        Self {
            handle,
            submitted_at: chrono::Utc::now(),
            state: JobState::Pending,
        }
    }

    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }

    pub fn submitted_at(&self) -> Timestamp {
        self.submitted_at
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Advance the job to `next`, rejecting backwards moves and any move
    /// out of a terminal state.
    pub fn transition(&mut self, next: JobState) -> Result<(), CoreError> {
        if !self.state.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        if self.state != next {
            tracing::debug!(
                operation = %self.handle,
                from = %self.state,
                to = %next,
                "Job state changed",
            );
        }
        self.state = next;
        Ok(())
    }
}
