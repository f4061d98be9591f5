//! Command-line argument definitions for wfverify.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

use crate::workflow::{JobId, WorkflowState, WorkflowStatus};

/// Command-line interface for wfverify.
#[derive(Debug, Parser)]
#[command(name = "wfverify")]
#[command(
    author,
    version,
    about = "Verify data workflow state transitions against the job scheduler"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Container engine socket path or URL.
    #[arg(long, global = true)]
    pub engine_socket: Option<String>,

    /// Driver identity used when completing driver entries.
    #[arg(long, global = true)]
    pub driver_id: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Submit a batch script and print the job id.
    Submit(SubmitArgs),

    /// Wait for a state in `DriverWait`, cross-check it, and complete the driver.
    Advance(StateArgs),

    /// Wait for a state in `Error` and cross-check it.
    ExpectError(StateArgs),

    /// Require the scheduler to report a workflow status.
    ExpectStatus(StatusArgs),

    /// Cross-check the workflow resource against the scheduler once.
    Check(JobArgs),

    /// Cancel the job and wait out the grace delay.
    Cancel(CancelArgs),

    /// Wait for the job to finish and require text in its system comment.
    Comment(CommentArgs),

    /// Advance the workflow through a range of states, then delete it.
    Walk(WalkArgs),

    /// Delete the workflow resource, tolerating its absence.
    Cleanup(JobArgs),
}

/// Arguments for the `submit` subcommand.
#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Path to the batch script inside the scheduler container.
    #[arg(required = true)]
    pub script: String,
}

/// Arguments naming only a job.
#[derive(Debug, Args)]
pub struct JobArgs {
    /// Scheduler job id.
    pub job: JobId,
}

/// Arguments naming a job and a workflow state.
#[derive(Debug, Args)]
pub struct StateArgs {
    /// Scheduler job id.
    pub job: JobId,

    /// Workflow state, e.g. `Proposal` or `datain`.
    pub state: WorkflowState,
}

/// Arguments for the `expect-status` subcommand.
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Scheduler job id.
    pub job: JobId,

    /// Expected workflow status, e.g. `DriverWait`.
    pub status: WorkflowStatus,
}

/// Arguments for the `cancel` subcommand.
#[derive(Debug, Args)]
pub struct CancelArgs {
    /// Scheduler job id.
    pub job: JobId,

    /// Skip data stage-out.
    #[arg(long)]
    pub purge: bool,
}

/// Arguments for the `comment` subcommand.
#[derive(Debug, Args)]
pub struct CommentArgs {
    /// Scheduler job id.
    pub job: JobId,

    /// Text the system comment must contain.
    pub text: String,
}

/// Arguments for the `walk` subcommand.
#[derive(Debug, Args)]
pub struct WalkArgs {
    /// Scheduler job id.
    pub job: JobId,

    /// First state to advance.
    #[arg(long, default_value_t = WorkflowState::Proposal)]
    pub from: WorkflowState,

    /// Last state to advance.
    #[arg(long, default_value_t = WorkflowState::Teardown)]
    pub to: WorkflowState,
}
