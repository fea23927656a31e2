//! Bounded polling of asynchronous jobs.
//!
//! A job is started once and then read at a fixed interval until it reports
//! a terminal status, the attempt budget runs out, or the caller cancels.
//! Each session is independent: polling the same resource twice runs two
//! sessions side by side.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{ApiError, JOB_FAILED_MESSAGE};

/// Default pause between reads.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Default number of reads before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

// ============================================================================
// Options
// ============================================================================

/// Interval and attempt budget of a poll session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Pause before each read.
    pub interval: Duration,
    /// Maximum number of reads.
    pub max_attempts: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PollOptions {
    /// Sets the interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the attempt budget. At least one read is always made.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

// ============================================================================
// Job Source
// ============================================================================

/// Status of a job as seen on one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Still running.
    Pending,
    /// Finished successfully.
    Completed,
    /// Finished with an error, optionally explained by the server.
    Failed(Option<String>),
}

/// Something that can start a job and report on it.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// What a read returns.
    type Resource: Send;

    /// Kicks off the job for `id`.
    async fn start(&self, id: i64) -> Result<(), ApiError>;

    /// Reads the current state of `id`.
    async fn fetch(&self, id: i64) -> Result<Self::Resource, ApiError>;

    /// Extracts the job status from a read.
    fn status(&self, resource: &Self::Resource) -> JobStatus;
}

// ============================================================================
// Poll State Machine
// ============================================================================

/// Where a poll session stands.
enum PollState<R> {
    /// `attempt` reads have been made without a terminal status.
    Pending { attempt: u32 },
    Completed(R),
    Failed(String),
    TimedOut { attempts: u32 },
    Cancelled,
}

/// Polls a [`JobSource`] until the job settles.
#[derive(Debug, Clone)]
pub struct JobPoller<S> {
    source: S,
    options: PollOptions,
}

impl<S: JobSource> JobPoller<S> {
    /// Creates a poller over `source`.
    pub fn new(source: S, options: PollOptions) -> Self {
        Self { source, options }
    }

    /// The options this poller runs with.
    pub fn options(&self) -> PollOptions {
        self.options
    }

    /// Starts the job for `id` and waits for it to settle.
    ///
    /// # Errors
    ///
    /// - [`ApiError::JobFailed`] if the job reports failure
    /// - [`ApiError::PollTimeout`] if the attempt budget runs out
    /// - [`ApiError::Cancelled`] if `cancel` fires
    /// - any error from the start call or a read
    #[instrument(skip(self, cancel), fields(max_attempts = self.options.max_attempts))]
    pub async fn poll_until_terminal(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> Result<S::Resource, ApiError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Cancelled before start");
                return Err(ApiError::Cancelled);
            }
            started = self.source.start(id) => started?,
        }
        debug!("Job started");

        self.wait_until_terminal(id, cancel).await
    }

    /// Waits for an already running job to settle, without starting it.
    ///
    /// # Errors
    ///
    /// Same as [`JobPoller::poll_until_terminal`], minus the start call.
    pub async fn wait_until_terminal(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> Result<S::Resource, ApiError> {
        let mut state = PollState::Pending { attempt: 0 };
        loop {
            state = match state {
                PollState::Pending { attempt } => self.step(id, attempt, cancel).await?,
                PollState::Completed(resource) => {
                    info!(id, "Job completed");
                    return Ok(resource);
                }
                PollState::Failed(message) => {
                    warn!(id, message = %message, "Job failed");
                    return Err(ApiError::JobFailed(message));
                }
                PollState::TimedOut { attempts } => {
                    warn!(id, attempts, "Job still pending, giving up");
                    return Err(ApiError::PollTimeout { attempts });
                }
                PollState::Cancelled => {
                    debug!(id, "Polling cancelled");
                    return Err(ApiError::Cancelled);
                }
            };
        }
    }

    /// Sleeps, reads once, and moves the state machine forward.
    async fn step(
        &self,
        id: i64,
        attempt: u32,
        cancel: &CancellationToken,
    ) -> Result<PollState<S::Resource>, ApiError> {
        if attempt >= self.options.max_attempts {
            return Ok(PollState::TimedOut { attempts: attempt });
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(PollState::Cancelled),
            () = tokio::time::sleep(self.options.interval) => {}
        }

        let resource = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(PollState::Cancelled),
            fetched = self.source.fetch(id) => fetched?,
        };

        let attempt = attempt + 1;
        let status = self.source.status(&resource);
        debug!(id, attempt, max = self.options.max_attempts, status = ?status, "Poll read");

        Ok(match status {
            JobStatus::Pending => PollState::Pending { attempt },
            JobStatus::Completed => PollState::Completed(resource),
            JobStatus::Failed(message) => PollState::Failed(
                message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| JOB_FAILED_MESSAGE.to_string()),
            ),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
