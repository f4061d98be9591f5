//! The job scheduler's view of submitted jobs.
//!
//! [`SchedulerClient`] is the collaborator seam the verifiers consume.
//! [`SlurmctldScheduler`] implements it by running Slurm commands inside the
//! controller container.

mod parse;
mod slurm;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

pub use self::parse::{FINAL_JOB_STATES, parse_job_record, parse_submitted_job_id, parse_workflow_status};
pub use self::slurm::SlurmctldScheduler;
use crate::error::SchedulerError;
use crate::workflow::{JobId, WorkflowState, WorkflowStatus};

/// Boxed future returned by [`SchedulerClient`] operations.
pub type SchedulerFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, SchedulerError>> + Send + 'a>>;

/// Operations the harness needs from the job scheduler.
pub trait SchedulerClient {
    /// Read the scheduler's record of the job's workflow state.
    fn job_status(&self, job_id: JobId) -> SchedulerFuture<'_, JobStatus>;

    /// Request cancellation. `purge` skips the job's data stage-out.
    fn cancel_job(&self, job_id: JobId, purge: bool) -> SchedulerFuture<'_, ()>;

    /// Read the job's accounting record.
    fn job_record(&self, job_id: JobId) -> SchedulerFuture<'_, JobRecord>;

    /// Submit a batch script and return the new job's id.
    fn submit_job(&self, script: &str) -> SchedulerFuture<'_, JobId>;
}

/// Workflow state as mirrored by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    /// The state the scheduler has asked the workflow to reach.
    pub desired_state: WorkflowState,
    /// The state the scheduler believes the workflow is in.
    pub current_state: WorkflowState,
    /// The scheduler's copy of the workflow status.
    pub status: WorkflowStatus,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(desiredState={}, currentState={}, status={})",
            self.desired_state, self.current_state, self.status
        )
    }
}

/// The parts of a job record the harness inspects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRecord {
    /// Scheduler job state, e.g. `RUNNING` or `CANCELLED`.
    pub job_state: String,
    /// `ExitCode` as reported (`<code>:<signal>`), when present.
    pub exit_code: Option<String>,
    /// Free-form comment the system attaches to the job.
    pub system_comment: String,
}

impl JobRecord {
    /// Whether the job has left the scheduler's active states.
    #[must_use]
    pub fn is_final(&self) -> bool {
        FINAL_JOB_STATES.contains(&self.job_state.as_str())
    }
}

impl fmt::Display for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "JobState={} ExitCode={}",
            self.job_state,
            self.exit_code.as_deref().unwrap_or("<unset>")
        )
    }
}
