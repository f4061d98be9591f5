//! Orchestration API for wfverify commands.
//!
//! [`run_command`] runs one [`Command`] against any [`WorkflowStore`] and
//! [`SchedulerClient`]; [`execute`] builds the production collaborators from
//! configuration first. Neither prints nor exits; the CLI adapter owns that.

use std::fmt;

use crate::config::AppConfig;
use crate::engine::{EngineConnector, SocketResolver};
use crate::error::{Result, StoreError};
use crate::scheduler::{JobRecord, JobStatus, SchedulerClient, SlurmctldScheduler};
use crate::store::{KubeWorkflowStore, WorkflowStore};
use crate::verify::{
    ErrorTransitionVerifier, TransitionVerifier, VerifySettings, WorkflowHandle, cancel_job,
    check_workflow, expect_job_status, expect_system_comment, walk,
};
use crate::workflow::{JobId, StatusSnapshot, WorkflowState, WorkflowStatus};

/// A single verification step, independent of how it was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Submit a batch script.
    Submit {
        /// Script path inside the scheduler container.
        script: String,
    },
    /// Verify `state` in `DriverWait` and complete the harness's driver.
    Advance {
        /// Target job.
        job: JobId,
        /// State to verify.
        state: WorkflowState,
    },
    /// Verify `state` in `Error` without mutating anything.
    ExpectError {
        /// Target job.
        job: JobId,
        /// State to verify.
        state: WorkflowState,
    },
    /// Require the scheduler to report `status`.
    ExpectStatus {
        /// Target job.
        job: JobId,
        /// Expected status.
        status: WorkflowStatus,
    },
    /// Cross-check the workflow resource and scheduler once.
    Check {
        /// Target job.
        job: JobId,
    },
    /// Cancel the job and wait out the grace delay.
    Cancel {
        /// Target job.
        job: JobId,
        /// Skip data stage-out. Also enabled by `verify.purge_on_cancel`.
        purge: bool,
    },
    /// Wait for the job to finish and require `text` in its system comment.
    Comment {
        /// Target job.
        job: JobId,
        /// Expected substring.
        text: String,
    },
    /// Advance through `from..=to`, then delete the workflow.
    Walk {
        /// Target job.
        job: JobId,
        /// First state.
        from: WorkflowState,
        /// Last state.
        to: WorkflowState,
    },
    /// Delete the workflow resource if it exists.
    Cleanup {
        /// Target job.
        job: JobId,
    },
}

/// What a successful command established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A job was submitted.
    Submitted {
        /// The new job.
        job: JobId,
    },
    /// A state was verified and the driver entry completed.
    Advanced {
        /// Target job.
        job: JobId,
        /// Verified state.
        state: WorkflowState,
    },
    /// A state was observed in `Error`.
    ErrorObserved {
        /// Target job.
        job: JobId,
        /// Observed state.
        state: WorkflowState,
    },
    /// The scheduler agreed with the workflow resource.
    Consistent {
        /// Target job.
        job: JobId,
        /// The resource's status at the time of the check.
        snapshot: StatusSnapshot,
    },
    /// The scheduler reported the expected status.
    StatusMatched {
        /// Target job.
        job: JobId,
        /// The scheduler's record.
        status: JobStatus,
    },
    /// Cancellation was requested and the grace delay elapsed.
    Cancelled {
        /// Target job.
        job: JobId,
        /// Whether stage-out was skipped.
        purge: bool,
    },
    /// The finished job's comment contained the expected text.
    CommentFound {
        /// Target job.
        job: JobId,
        /// The final job record.
        record: JobRecord,
    },
    /// Every state in a range was verified and the workflow deleted.
    Walked {
        /// Target job.
        job: JobId,
        /// States verified, in order.
        states: Vec<WorkflowState>,
    },
    /// The workflow was deleted, or was already absent.
    CleanedUp {
        /// Target job.
        job: JobId,
        /// Whether a resource was present to delete.
        existed: bool,
    },
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted { job } => write!(f, "{job}"),
            Self::Advanced { job, state } => {
                write!(f, "job {job}: {state} verified, driver completed")
            }
            Self::ErrorObserved { job, state } => write!(f, "job {job}: {state} reached Error"),
            Self::Consistent { job, snapshot } => {
                write!(f, "job {job}: workflow {snapshot} agrees with scheduler")
            }
            Self::StatusMatched { job, status } => {
                write!(f, "job {job}: scheduler reports {status}")
            }
            Self::Cancelled { job, purge } => {
                write!(f, "job {job}: cancelled (purge={purge})")
            }
            Self::CommentFound { job, record } => {
                write!(f, "job {job}: {record} SystemComment={}", record.system_comment)
            }
            Self::Walked { job, states } => {
                let path = states
                    .iter()
                    .copied()
                    .map(WorkflowState::as_str)
                    .collect::<Vec<_>>()
                    .join(" -> ");
                write!(f, "job {job}: walked {path}; workflow deleted")
            }
            Self::CleanedUp { job, existed: true } => write!(f, "job {job}: workflow deleted"),
            Self::CleanedUp { job, existed: false } => {
                write!(f, "job {job}: no workflow to delete")
            }
        }
    }
}

/// Run `command` against the given collaborators.
///
/// Single-step commands leave the workflow in place so a caller can chain
/// them; `Walk` and `Cleanup` delete it.
///
/// # Errors
///
/// Returns the failing step's error: `VerifyError` for verification
/// failures, `StoreError` or `SchedulerError` for collaborator failures, and
/// `ConfigError::InvalidValue` for an inverted walk range.
pub async fn run_command<S, C>(
    command: &Command,
    store: &S,
    scheduler: &C,
    settings: &VerifySettings,
) -> Result<CommandOutcome>
where
    S: WorkflowStore,
    C: SchedulerClient,
{
    match command {
        Command::Submit { script } => {
            let job = scheduler.submit_job(script).await?;
            tracing::info!(%job, script, "job submitted");
            Ok(CommandOutcome::Submitted { job })
        }
        Command::Advance { job, state } => {
            let handle = WorkflowHandle::acquire(store, *job).await?;
            TransitionVerifier::new(&handle, scheduler, settings)
                .advance(*state)
                .await?;
            Ok(CommandOutcome::Advanced {
                job: *job,
                state: *state,
            })
        }
        Command::ExpectError { job, state } => {
            let handle = WorkflowHandle::acquire(store, *job).await?;
            ErrorTransitionVerifier::new(&handle, scheduler, settings)
                .expect_error(*state)
                .await?;
            Ok(CommandOutcome::ErrorObserved {
                job: *job,
                state: *state,
            })
        }
        Command::ExpectStatus { job, status } => {
            let reported = expect_job_status(scheduler, *job, status).await?;
            Ok(CommandOutcome::StatusMatched {
                job: *job,
                status: reported,
            })
        }
        Command::Check { job } => {
            let handle = WorkflowHandle::acquire(store, *job).await?;
            let (snapshot, _) = check_workflow(&handle, scheduler).await?;
            Ok(CommandOutcome::Consistent {
                job: *job,
                snapshot,
            })
        }
        Command::Cancel { job, purge } => {
            let effective = *purge || settings.purge_on_cancel;
            cancel_job(scheduler, *job, effective, settings).await?;
            Ok(CommandOutcome::Cancelled {
                job: *job,
                purge: effective,
            })
        }
        Command::Comment { job, text } => {
            let record = expect_system_comment(scheduler, *job, text, settings.poll).await?;
            Ok(CommandOutcome::CommentFound { job: *job, record })
        }
        Command::Walk { job, from, to } => {
            let states = walk(store, scheduler, *job, *from, *to, settings).await?;
            Ok(CommandOutcome::Walked { job: *job, states })
        }
        Command::Cleanup { job } => {
            let existed = match store.delete(*job).await {
                Ok(()) => true,
                Err(StoreError::NotFound { .. }) => false,
                Err(error) => return Err(error.into()),
            };
            tracing::info!(%job, existed, "workflow cleanup finished");
            Ok(CommandOutcome::CleanedUp { job: *job, existed })
        }
    }
}

/// Connect the production collaborators and run `command` to completion.
///
/// The container engine is health-checked before the scheduler is used. The
/// store client is built from the ambient kubeconfig or in-cluster
/// credentials.
///
/// # Errors
///
/// Returns `ContainerError` if the engine is unreachable,
/// `StoreError::ClientInit` if no Kubernetes client can be built, and any
/// error from [`run_command`].
pub fn execute<E: mockable::Env>(
    config: &AppConfig,
    command: &Command,
    runtime: &tokio::runtime::Handle,
    env: &E,
) -> Result<CommandOutcome> {
    let settings = VerifySettings::from(&config.verify);
    runtime.block_on(async {
        let resolver = SocketResolver::new(env);
        let docker = EngineConnector::connect_with_fallback_and_verify_async(
            config.engine_socket.as_deref(),
            &resolver,
        )
        .await?;
        let scheduler = SlurmctldScheduler::new(docker, &config.scheduler);
        let store = KubeWorkflowStore::connect(&config.store).await?;
        run_command(command, &store, &scheduler, &settings).await
    })
}
