//! Clock-driven polling of a submitted job until it reaches a terminal
//! state, the budget runs out, or the run is cancelled.
//!
//! Every wait is a `tokio::select!` against the [`CancellationToken`],
//! and every sleep is clipped to the deadline, so [`JobPoller::wait`]
//! returns at most one request timeout after the budget.

use std::time::Duration;

use showreel_core::artifact::Artifact;
use showreel_core::error::CoreError;
use showreel_core::job::{Job, JobState};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::messages::OperationStatus;
use crate::service::VideoService;

/// Timing for one poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Wait between polls of a running job.
    pub interval: Duration,
    /// Wait after a transient transport failure.
    pub retry_interval: Duration,
    /// Total time allowed from the first poll.
    pub budget: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            retry_interval: Duration::from_secs(5),
            budget: Duration::from_secs(600),
        }
    }
}

/// Polls one job at a time.
#[derive(Debug, Clone, Default)]
pub struct JobPoller {
    config: PollerConfig,
}

impl JobPoller {
    /// Create a poller with the given cadence and budget.
    pub fn new(config: PollerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Wait for `job` to finish and return its artifacts.
    ///
    /// Updates `job`'s state along the way. Transport errors are retried
    /// until the deadline; auth errors and cancellation return at once.
    pub async fn wait(
        &self,
        service: &dyn VideoService,
        job: &mut Job,
        cancel: &CancellationToken,
    ) -> Result<Vec<Artifact>, CoreError> {
        let deadline = Instant::now() + self.config.budget;
        let mut last_transient: Option<String> = None;
        let mut attempt = 0u32;

        loop {
            if Instant::now() >= deadline {
                return Err(self.time_out(job, last_transient)?);
            }
            attempt += 1;

            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(CoreError::Cancelled),
                result = service.poll(job.handle()) => result,
            };

            let delay = match result {
                Ok(OperationStatus::Running) => {
                    job.transition(JobState::Running)?;
                    tracing::debug!(operation = %job.handle(), attempt, "Job still running");
                    self.config.interval
                }
                Ok(OperationStatus::Succeeded(artifacts)) => {
                    job.transition(JobState::Done)?;
                    tracing::info!(
                        operation = %job.handle(),
                        attempt,
                        artifacts = artifacts.len(),
                        "Job finished",
                    );
                    return Ok(artifacts);
                }
                Ok(OperationStatus::Failed { code, message }) => {
                    job.transition(JobState::Failed)?;
                    tracing::warn!(operation = %job.handle(), code, message = %message, "Job failed");
                    return Err(CoreError::JobFailed { code, message });
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(
                        operation = %job.handle(),
                        error = %e,
                        "Poll attempt {attempt} failed, retrying",
                    );
                    last_transient = Some(e.to_string());
                    self.config.retry_interval
                }
                Err(e) => return Err(e),
            };

            let now = Instant::now();
            if now >= deadline {
                return Err(self.time_out(job, last_transient)?);
            }
            let sleep_for = delay.min(deadline - now);

            tokio::select! {
                _ = cancel.cancelled() => return Err(CoreError::Cancelled),
                _ = tokio::time::sleep(sleep_for) => {}
            }
        }
    }

    fn time_out(&self, job: &mut Job, last_transient: Option<String>) -> Result<CoreError, CoreError> {
        job.transition(JobState::Timeout)?;
        tracing::warn!(
            operation = %job.handle(),
            budget_secs = self.config.budget.as_secs(),
            "Job timed out",
        );
        Ok(CoreError::Timeout {
            budget_secs: self.config.budget.as_secs(),
            last_transient,
        })
    }
}
