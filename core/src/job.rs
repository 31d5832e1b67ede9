//! Background-job completion: poll a job's status until it goes inactive,
//! then fetch its result exactly once.
//!
//! # Design
//! The protocol lives in [`JobPoller`], a small state machine that only
//! builds requests and interprets responses — no I/O, no clock. The async
//! [`resolve`] driver executes it against a [`Transport`], inserting a
//! fixed-interval sleep between status polls. Splitting the two keeps the
//! transition rules testable without a runtime and the waiting testable
//! with tokio's paused time.
//!
//! There is no retry anywhere in the loop: a transport error during a poll
//! or the result fetch aborts the wait and propagates to the caller.

use std::time::Duration;

use tracing::{debug, info};

use crate::api::QuickSetupApi;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

/// Default lower bound on the time between two status polls for one job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Polling behavior for background-job resolution.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Minimum time between successive status queries for a given job.
    pub interval: Duration,
    /// Optional deadline for the whole wait. `None` (the default) preserves
    /// the server contract of an unbounded wait: the loop relies on the job
    /// eventually reporting inactive.
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

/// Where a [`JobPoller`] currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Querying job status until `active` turns false.
    Polling,
    /// Status reported inactive; the single result fetch is next.
    Fetching,
    /// A terminal step was produced; the poller is spent.
    Finished,
}

/// What the host must do after feeding a response to the poller.
#[derive(Debug)]
pub enum Step {
    /// Job still active: wait one poll interval, then issue
    /// [`JobPoller::next_request`] again.
    Wait,
    /// Job went inactive: issue the result fetch immediately.
    Fetch,
    /// The job's final payload.
    Done(serde_json::Value),
}

/// Sans-IO state machine for resolving one background job.
///
/// All requests it produces target the job id it was created with. Once
/// the status reports inactive the job is terminal, so exactly one result
/// fetch follows and the poller refuses further use.
#[derive(Debug)]
pub struct JobPoller {
    api: QuickSetupApi,
    job_id: String,
    state: PollState,
}

impl JobPoller {
    pub fn new(api: QuickSetupApi, job_id: impl Into<String>) -> Self {
        Self {
            api,
            job_id: job_id.into(),
            state: PollState::Polling,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// The request to execute for the current state, or `None` once the
    /// poller has finished.
    pub fn next_request(&self) -> Option<HttpRequest> {
        match self.state {
            PollState::Polling => Some(self.api.build_job_status(&self.job_id)),
            PollState::Fetching => Some(self.api.build_job_result(&self.job_id)),
            PollState::Finished => None,
        }
    }

    /// Feed back the response for the request produced by
    /// [`next_request`](Self::next_request).
    ///
    /// Any parse or HTTP error finishes the poller and propagates.
    ///
    /// # Panics
    /// Panics if called after the poller has finished.
    pub fn on_response(&mut self, response: HttpResponse) -> Result<Step, ApiError> {
        match self.state {
            PollState::Polling => match self.api.parse_job_status(response) {
                Ok(status) if status.is_active() => Ok(Step::Wait),
                Ok(_) => {
                    self.state = PollState::Fetching;
                    Ok(Step::Fetch)
                }
                Err(err) => {
                    self.state = PollState::Finished;
                    Err(err)
                }
            },
            PollState::Fetching => {
                self.state = PollState::Finished;
                Ok(Step::Done(self.api.parse_job_result(response)?))
            }
            PollState::Finished => unreachable!("job poller used after resolution"),
        }
    }
}

/// Drive a [`JobPoller`] to completion over `transport`, sleeping
/// `config.interval` between status polls.
pub(crate) async fn resolve<T: Transport>(
    transport: &T,
    api: &QuickSetupApi,
    job_id: &str,
    config: &PollConfig,
) -> Result<serde_json::Value, ApiError> {
    let started = tokio::time::Instant::now();
    let mut poller = JobPoller::new(api.clone(), job_id);
    debug!(job_id, "waiting for background job");

    while let Some(request) = poller.next_request() {
        let response = transport.execute(request).await?;
        match poller.on_response(response)? {
            Step::Wait => {
                if let Some(timeout) = config.timeout {
                    let elapsed = started.elapsed();
                    if elapsed >= timeout {
                        return Err(ApiError::JobTimeout { elapsed });
                    }
                }
                debug!(job_id, "job still active, polling again in {:?}", config.interval);
                tokio::time::sleep(config.interval).await;
            }
            Step::Fetch => {}
            Step::Done(value) => {
                info!(job_id, "background job finished");
                return Ok(value);
            }
        }
    }

    unreachable!("job poller stopped without a terminal step")
}
