//! Observation of the error path. Nothing is written.

use crate::error::Result;
use crate::scheduler::SchedulerClient;
use crate::store::WorkflowStore;
use crate::workflow::{StatusSnapshot, WorkflowState, WorkflowStatus};

use super::VerifySettings;
use super::handle::WorkflowHandle;
use super::transition::converge;

/// Confirms a workflow halted with `Error` at a given state.
pub struct ErrorTransitionVerifier<'h, 'a, S, C> {
    handle: &'h WorkflowHandle<'a, S>,
    scheduler: &'h C,
    settings: &'h VerifySettings,
}

impl<'h, 'a, S, C> ErrorTransitionVerifier<'h, 'a, S, C>
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

    /// Wait for `target` in `Error` and cross-check the scheduler.
    ///
    /// Calling this again against an unchanged workflow gives the same
    /// result.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::TimeoutExceeded` if the error status is not
    /// reached and `VerifyError::Mismatch` if the scheduler disagrees.
    pub async fn expect_error(&self, target: WorkflowState) -> Result<StatusSnapshot> {
        converge(
            self.handle,
            self.scheduler,
            self.settings.poll,
            target,
            &WorkflowStatus::Error,
        )
        .await
    }
}
