//! Cross-check between the workflow resource and the scheduler.

use crate::error::{StatusField, StatusMismatch};
use crate::scheduler::JobStatus;
use crate::workflow::{WorkflowState, WorkflowStatus};

/// Compare the resource's `state` and `status` with the scheduler's record.
///
/// Fields are compared in the order `desiredState`, `currentState`,
/// `status`; the first disagreement is reported.
///
/// # Errors
///
/// Returns the first [`StatusMismatch`] found.
pub fn check(
    state: WorkflowState,
    status: &WorkflowStatus,
    job: &JobStatus,
) -> Result<(), StatusMismatch> {
    let mismatch = |field: StatusField, actual: String| StatusMismatch {
        field,
        expected: match field {
            StatusField::Status => status.to_string(),
            StatusField::DesiredState | StatusField::CurrentState => state.to_string(),
        },
        actual,
    };

    if job.desired_state != state {
        return Err(mismatch(StatusField::DesiredState, job.desired_state.to_string()));
    }
    if job.current_state != state {
        return Err(mismatch(StatusField::CurrentState, job.current_state.to_string()));
    }
    if job.status != *status {
        return Err(mismatch(StatusField::Status, job.status.to_string()));
    }
    Ok(())
}
