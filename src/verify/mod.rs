//! State-transition verification.
//!
//! A scenario binds a [`WorkflowHandle`] to a job, then calls
//! [`TransitionVerifier::advance`] once per expected state. Each call waits
//! through the [`Poller`] for the state to be reached in `DriverWait`,
//! cross-checks the scheduler with [`check`], and completes the harness's
//! driver entry so the controller can move on. [`ErrorTransitionVerifier`]
//! observes the error path without mutating anything.

mod consistency;
mod error_path;
mod handle;
mod job;
mod poller;
mod transition;

use std::time::Duration;

pub use self::consistency::check;
pub use self::error_path::ErrorTransitionVerifier;
pub use self::handle::WorkflowHandle;
pub use self::job::{
    cancel_job, check_workflow, expect_job_status, expect_system_comment, final_job_state, walk,
};
pub use self::poller::{PollSettings, Poller};
pub use self::transition::TransitionVerifier;
use crate::config::VerifyConfig;

/// Settings shared by every verification step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifySettings {
    /// Driver identity whose entries the harness completes.
    pub driver_id: String,
    /// Wait budget and cadence.
    pub poll: PollSettings,
    /// Pause after a cancellation request before verification resumes.
    pub cancel_grace: Duration,
    /// Whether cancellations skip data stage-out.
    pub purge_on_cancel: bool,
}

impl From<&VerifyConfig> for VerifySettings {
    fn from(config: &VerifyConfig) -> Self {
        Self {
            driver_id: config.driver_id.clone(),
            poll: PollSettings {
                timeout: config.poll_timeout(),
                interval: config.poll_interval(),
            },
            cancel_grace: config.cancel_grace(),
            purge_on_cancel: config.purge_on_cancel,
        }
    }
}
