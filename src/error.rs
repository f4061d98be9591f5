//! Semantic error types for wfverify.
//!
//! Conditions a caller may want to inspect are semantic enums (via
//! `thiserror`), one per concern. The binary converts them into opaque
//! `eyre::Report`s only at its boundary.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::workflow::{JobId, WorkflowState};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found at the expected path.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path where the configuration file was expected.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A required configuration value is missing.
    #[error("missing required configuration: {field}")]
    MissingRequired {
        /// The name of the missing field.
        field: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The `OrthoConfig` library returned an error while merging layers.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// Errors raised while talking to the container engine that hosts the
/// scheduler controller.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Failed to connect to the container engine socket.
    #[error("failed to connect to container engine: {message}")]
    ConnectionFailed {
        /// A description of the connection failure.
        message: String,
    },

    /// Failed to create the async runtime used by blocking entry points.
    #[error("failed to create async runtime: {message}")]
    RuntimeCreationFailed {
        /// A description of the runtime failure.
        message: String,
    },

    /// Failed to execute a command in a container.
    #[error("failed to execute command in container '{container_id}': {message}")]
    ExecFailed {
        /// The ID of the container.
        container_id: String,
        /// A description of the execution failure.
        message: String,
    },

    /// Health check failed - engine did not respond correctly.
    #[error("container engine health check failed: {message}")]
    HealthCheckFailed {
        /// A description of the health check failure.
        message: String,
    },

    /// Health check timed out.
    #[error("container engine health check timed out after {seconds} seconds")]
    HealthCheckTimeout {
        /// The timeout duration in seconds.
        seconds: u64,
    },
}

/// Errors reported by the workflow resource store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The workflow resource does not exist.
    #[error("workflow '{name}' not found")]
    NotFound {
        /// Name of the workflow resource.
        name: String,
    },

    /// The workflow changed between the read and the write.
    #[error("workflow '{name}' was modified after revision {revision}")]
    Conflict {
        /// Name of the workflow resource.
        name: String,
        /// Revision the rejected write was based on.
        revision: String,
    },

    /// The status block could not be interpreted.
    #[error("workflow '{name}' has a malformed status: {message}")]
    MalformedStatus {
        /// Name of the workflow resource.
        name: String,
        /// A description of the problem.
        message: String,
    },

    /// The request failed for any other reason.
    #[error("request for workflow '{name}' failed: {message}")]
    RequestFailed {
        /// Name of the workflow resource.
        name: String,
        /// A description of the failure.
        message: String,
    },

    /// The store client could not be initialised.
    #[error("failed to initialise workflow store client: {message}")]
    ClientInit {
        /// A description of the failure.
        message: String,
    },
}

/// Errors reported by the scheduler client.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A scheduler command exited unsuccessfully.
    #[error("scheduler command '{command}' exited with code {exit_code}: {stderr}")]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Its exit code.
        exit_code: i64,
        /// Its trimmed standard error.
        stderr: String,
    },

    /// A scheduler command printed output that could not be interpreted.
    #[error("unexpected output from '{command}': {message}")]
    MalformedOutput {
        /// The command line that was run.
        command: String,
        /// A description of the problem.
        message: String,
    },

    /// The command could not be run at all.
    #[error("could not run scheduler command '{command}': {message}")]
    Unreachable {
        /// The command line that was attempted.
        command: String,
        /// A description of the transport failure.
        message: String,
    },
}

/// A status field compared between the workflow resource and the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusField {
    /// The scheduler's `desiredState`.
    DesiredState,
    /// The scheduler's `currentState`.
    CurrentState,
    /// The scheduler's `status`.
    Status,
}

impl fmt::Display for StatusField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DesiredState => "desiredState",
            Self::CurrentState => "currentState",
            Self::Status => "status",
        })
    }
}

/// The scheduler's job record disagrees with the workflow resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("incorrect {field}: expected {expected}, scheduler reports {actual}")]
pub struct StatusMismatch {
    /// The first field found to disagree.
    pub field: StatusField,
    /// Value taken from the workflow resource.
    pub expected: String,
    /// Value reported by the scheduler.
    pub actual: String,
}

/// Verification failures. Each one fails the current scenario.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// No workflow resource exists for the job.
    #[error("workflow for job {job_id} not found")]
    WorkflowMissing {
        /// The job whose workflow was expected.
        job_id: JobId,
    },

    /// A wait condition was not met before its deadline.
    #[error("timed out after {timeout_ms} ms waiting for {description}; last observed {last_observed}")]
    TimeoutExceeded {
        /// What was being waited for.
        description: String,
        /// The configured wait budget.
        timeout_ms: u64,
        /// Rendering of the last value fetched before the deadline.
        last_observed: String,
    },

    /// The scheduler's view disagrees with the workflow resource.
    #[error(transparent)]
    Mismatch(#[from] StatusMismatch),

    /// The expected driver registration is absent.
    #[error("driver '{driver_id}' has no pending entry for state {state}")]
    DriverNotFound {
        /// The harness's driver identity.
        driver_id: String,
        /// The state the entry should watch.
        state: WorkflowState,
    },

    /// The job's system comment lacks the expected text.
    #[error("system comment for job {job_id} does not contain '{expected}': '{actual}'")]
    CommentMismatch {
        /// The job inspected.
        job_id: JobId,
        /// Text that was expected.
        expected: String,
        /// The comment actually reported.
        actual: String,
    },
}

/// Top-level error type for wfverify.
#[derive(Debug, Error)]
pub enum WfverifyError {
    /// An error occurred during configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred talking to the container engine.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// An error occurred in the workflow store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An error occurred in the scheduler client.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// A verification step failed.
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

impl From<StatusMismatch> for WfverifyError {
    fn from(mismatch: StatusMismatch) -> Self {
        Self::Verify(VerifyError::Mismatch(mismatch))
    }
}

/// A specialised `Result` type for wfverify operations.
pub type Result<T> = std::result::Result<T, WfverifyError>;
