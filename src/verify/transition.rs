//! Forward progress: wait, cross-check, then complete the driver entry.

use crate::error::{Result, VerifyError};
use crate::scheduler::SchedulerClient;
use crate::store::WorkflowStore;
use crate::workflow::{StatusSnapshot, WorkflowState, WorkflowStatus};

use super::consistency::check;
use super::handle::WorkflowHandle;
use super::poller::{PollSettings, Poller};
use super::VerifySettings;

/// Wait until the workflow reports `(state, status)` in a single snapshot,
/// then require the scheduler to agree.
pub(super) async fn converge<S, C>(
    handle: &WorkflowHandle<'_, S>,
    scheduler: &C,
    poll: PollSettings,
    state: WorkflowState,
    status: &WorkflowStatus,
) -> Result<StatusSnapshot>
where
    S: WorkflowStore,
    C: SchedulerClient,
{
    let job_id = handle.job_id();
    let description = format!("workflow {job_id} to reach {state}/{status}");
    let snapshot = Poller::new(poll)
        .wait_until(
            &description,
            move || handle.fetch(),
            |snapshot: &StatusSnapshot| snapshot.is_at(state, status),
        )
        .await?;

    let job_status = scheduler.job_status(job_id).await?;
    check(state, status, &job_status)?;
    tracing::info!(%job_id, %state, %status, "workflow state verified");
    Ok(snapshot)
}

/// Drives a workflow forward one state at a time.
pub struct TransitionVerifier<'h, 'a, S, C> {
    handle: &'h WorkflowHandle<'a, S>,
    scheduler: &'h C,
    settings: &'h VerifySettings,
}

impl<'h, 'a, S, C> TransitionVerifier<'h, 'a, S, C>
where
    S: WorkflowStore,
    C: SchedulerClient,
{
    /// Create a verifier over a handle and scheduler.
    #[must_use]
    pub const fn new(
        handle: &'h WorkflowHandle<'a, S>,
        scheduler: &'h C,
        settings: &'h VerifySettings,
    ) -> Self {
        Self {
            handle,
            scheduler,
            settings,
        }
    }

    /// Verify `target` was reached in `DriverWait` and complete the
    /// harness's pending driver entry for it.
    ///
    /// Returns the snapshot as written back. Whether the controller then
    /// moves on is confirmed by the next call.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::TimeoutExceeded` if the state is not reached,
    /// `VerifyError::Mismatch` if the scheduler disagrees,
    /// `VerifyError::DriverNotFound` if no pending entry watches `target`,
    /// and `StoreError::Conflict` if the resource changed before the write.
    pub async fn advance(&self, target: WorkflowState) -> Result<StatusSnapshot> {
        let mut snapshot = converge(
            self.handle,
            self.scheduler,
            self.settings.poll,
            target,
            &WorkflowStatus::DriverWait,
        )
        .await?;

        let driver_id = self.settings.driver_id.as_str();
        let positions = snapshot.pending_driver_positions(driver_id, target);
        if positions.len() > 1 {
            tracing::warn!(
                job_id = %self.handle.job_id(),
                driver_id,
                state = %target,
                matches = positions.len(),
                "several pending driver entries match; completing the first"
            );
        }
        let Some(entry) = positions
            .first()
            .and_then(|&position| snapshot.drivers.get_mut(position))
        else {
            return Err(VerifyError::DriverNotFound {
                driver_id: String::from(driver_id),
                state: target,
            }
            .into());
        };
        entry.mark_completed();

        self.handle.save_driver_statuses(&snapshot).await?;
        tracing::info!(
            job_id = %self.handle.job_id(),
            driver_id,
            state = %target,
            "driver entry completed"
        );
        Ok(snapshot)
    }
}
