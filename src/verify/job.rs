//! Job-level steps: cancellation, final state, comments and whole walks.

use crate::error::{ConfigError, Result, StatusField, StatusMismatch, VerifyError};
use crate::scheduler::{JobRecord, JobStatus, SchedulerClient};
use crate::store::WorkflowStore;
use crate::workflow::{JobId, StatusSnapshot, WorkflowState, WorkflowStatus};

use super::consistency::check;
use super::handle::WorkflowHandle;
use super::poller::{PollSettings, Poller};
use super::transition::TransitionVerifier;
use super::VerifySettings;

/// Cancel `job_id`, then wait out the grace delay.
///
/// The scheduler gives no acknowledgment once the controller has seen the
/// cancellation. The delay gives the controller time to poll before any
/// verification resumes; it is a heuristic, not a guarantee.
///
/// # Errors
///
/// Propagates the scheduler's failure to cancel.
pub async fn cancel_job<C: SchedulerClient>(
    scheduler: &C,
    job_id: JobId,
    purge: bool,
    settings: &VerifySettings,
) -> Result<()> {
    scheduler.cancel_job(job_id, purge).await?;
    tracing::info!(
        %job_id,
        purge,
        grace_ms = u64::try_from(settings.cancel_grace.as_millis()).unwrap_or(u64::MAX),
        "job cancelled; waiting for the controller to notice"
    );
    tokio::time::sleep(settings.cancel_grace).await;
    Ok(())
}

/// Wait until the scheduler reports a final job state and return that
/// record.
///
/// # Errors
///
/// Returns `VerifyError::TimeoutExceeded` if the job is still active when
/// the budget runs out, or the scheduler's error if a read fails.
pub async fn final_job_state<C: SchedulerClient>(
    scheduler: &C,
    job_id: JobId,
    poll: PollSettings,
) -> Result<JobRecord> {
    Poller::new(poll)
        .wait_until(
            &format!("job {job_id} to finish"),
            move || async move { Ok(scheduler.job_record(job_id).await?) },
            JobRecord::is_final,
        )
        .await
}

/// Wait for the job to finish and require `expected` in its system comment.
///
/// # Errors
///
/// Returns `VerifyError::CommentMismatch` when the text is absent, plus any
/// error from [`final_job_state`].
pub async fn expect_system_comment<C: SchedulerClient>(
    scheduler: &C,
    job_id: JobId,
    expected: &str,
    poll: PollSettings,
) -> Result<JobRecord> {
    let record = final_job_state(scheduler, job_id, poll).await?;
    if !record.system_comment.contains(expected) {
        return Err(VerifyError::CommentMismatch {
            job_id,
            expected: String::from(expected),
            actual: record.system_comment,
        }
        .into());
    }
    Ok(record)
}

/// Read the scheduler once and require its workflow status to be `expected`.
///
/// # Errors
///
/// Returns `VerifyError::Mismatch` on the `status` field when it differs.
pub async fn expect_job_status<C: SchedulerClient>(
    scheduler: &C,
    job_id: JobId,
    expected: &WorkflowStatus,
) -> Result<JobStatus> {
    let job_status = scheduler.job_status(job_id).await?;
    if job_status.status != *expected {
        return Err(StatusMismatch {
            field: StatusField::Status,
            expected: expected.to_string(),
            actual: job_status.status.to_string(),
        }
        .into());
    }
    Ok(job_status)
}

/// Cross-check the workflow's current status against the scheduler once,
/// without waiting.
///
/// A workflow that has not reported a state yet disagrees with any
/// scheduler record.
///
/// # Errors
///
/// Returns `VerifyError::Mismatch` for the first disagreeing field.
pub async fn check_workflow<S, C>(
    handle: &WorkflowHandle<'_, S>,
    scheduler: &C,
) -> Result<(StatusSnapshot, JobStatus)>
where
    S: WorkflowStore,
    C: SchedulerClient,
{
    let snapshot = handle.fetch().await?;
    let job_status = scheduler.job_status(handle.job_id()).await?;
    let (Some(state), Some(status)) = (snapshot.state, snapshot.status.as_ref()) else {
        return Err(StatusMismatch {
            field: StatusField::DesiredState,
            expected: String::from("<unset>"),
            actual: job_status.desired_state.to_string(),
        }
        .into());
    };
    check(state, status, &job_status)?;
    Ok((snapshot, job_status))
}

/// Advance the workflow through every state from `from` to `to`, then
/// delete it whatever the outcome.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if `to` precedes `from`,
/// `VerifyError::WorkflowMissing` if there is no workflow, or the first
/// failing [`TransitionVerifier::advance`] error.
pub async fn walk<S, C>(
    store: &S,
    scheduler: &C,
    job_id: JobId,
    from: WorkflowState,
    to: WorkflowState,
    settings: &VerifySettings,
) -> Result<Vec<WorkflowState>>
where
    S: WorkflowStore,
    C: SchedulerClient,
{
    if to < from {
        return Err(ConfigError::InvalidValue {
            field: String::from("to"),
            reason: format!("{to} comes before {from}"),
        }
        .into());
    }

    let handle = WorkflowHandle::acquire(store, job_id).await?;
    let outcome = advance_through(&handle, scheduler, from, to, settings).await;
    handle.release(outcome).await
}

async fn advance_through<S, C>(
    handle: &WorkflowHandle<'_, S>,
    scheduler: &C,
    from: WorkflowState,
    to: WorkflowState,
    settings: &VerifySettings,
) -> Result<Vec<WorkflowState>>
where
    S: WorkflowStore,
    C: SchedulerClient,
{
    let verifier = TransitionVerifier::new(handle, scheduler, settings);
    let mut visited = Vec::new();
    for state in from.through(to) {
        verifier.advance(state).await?;
        visited.push(state);
    }
    Ok(visited)
}
