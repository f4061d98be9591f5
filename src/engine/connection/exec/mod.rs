//! Captured command execution inside a running container.
//!
//! Exec calls sit behind a small trait seam so the capture lifecycle can be
//! unit-tested without a live daemon.

mod capture;

use std::future::Future;
use std::pin::Pin;

use bollard::exec::{CreateExecOptions, CreateExecResults, StartExecOptions, StartExecResults};
use bollard::{Docker, errors::Error as BollardError};

use self::capture::{collect_output_async, wait_for_exit_code_async};
use super::EngineConnector;
use crate::error::{ConfigError, ContainerError, WfverifyError};

pub(super) const EXEC_INSPECT_POLL_INTERVAL_MS: u64 = 100;

/// Boxed future type returned by [`ContainerExecClient::create_exec`].
pub type CreateExecFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CreateExecResults, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`ContainerExecClient::start_exec`].
pub type StartExecFuture<'a> =
    Pin<Box<dyn Future<Output = Result<StartExecResults, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`ContainerExecClient::inspect_exec`].
pub type InspectExecFuture<'a> = Pin<
    Box<
        dyn Future<Output = Result<bollard::models::ExecInspectResponse, BollardError>> + Send + 'a,
    >,
>;

/// Behaviour required to run and inspect exec sessions.
pub trait ContainerExecClient {
    /// Create an exec session in a running container.
    fn create_exec(
        &self,
        container_id: &str,
        options: CreateExecOptions<String>,
    ) -> CreateExecFuture<'_>;

    /// Start a previously created exec session.
    fn start_exec(&self, exec_id: &str, options: Option<StartExecOptions>) -> StartExecFuture<'_>;

    /// Inspect an exec session for running status and exit code.
    fn inspect_exec(&self, exec_id: &str) -> InspectExecFuture<'_>;
}

impl ContainerExecClient for Docker {
    fn create_exec(
        &self,
        container_id: &str,
        options: CreateExecOptions<String>,
    ) -> CreateExecFuture<'_> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move { Self::create_exec(self, &container_id_owned, options).await })
    }

    fn start_exec(&self, exec_id: &str, options: Option<StartExecOptions>) -> StartExecFuture<'_> {
        let exec_id_owned = String::from(exec_id);
        Box::pin(async move { Self::start_exec(self, &exec_id_owned, options).await })
    }

    fn inspect_exec(&self, exec_id: &str) -> InspectExecFuture<'_> {
        let exec_id_owned = String::from(exec_id);
        Box::pin(async move { Self::inspect_exec(self, &exec_id_owned).await })
    }
}

/// Parameters required to run a command in a running container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    container_id: String,
    command: Vec<String>,
    user: Option<String>,
    working_dir: Option<String>,
}

impl ExecRequest {
    /// Create a new command execution request.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired` when `container_id` or `command`
    /// is empty, and `ConfigError::InvalidValue` when the executable is blank.
    pub fn new(
        container_id: impl Into<String>,
        command: Vec<String>,
    ) -> Result<Self, WfverifyError> {
        let container_id_value = container_id.into();
        let id = String::from(validate_required_field("container", &container_id_value)?);
        let validated_command = validate_command(command)?;

        Ok(Self {
            container_id: id,
            command: validated_command,
            user: None,
            working_dir: None,
        })
    }

    /// Run the command as `user`. Blank values leave the image default.
    #[must_use]
    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user.filter(|value| !value.trim().is_empty());
        self
    }

    /// Run the command from `working_dir`. Blank values leave the image
    /// default.
    #[must_use]
    pub fn with_working_dir(mut self, working_dir: Option<String>) -> Self {
        self.working_dir = working_dir.filter(|value| !value.trim().is_empty());
        self
    }

    /// Return target container identifier.
    #[must_use]
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Return command argv entries.
    #[must_use]
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Return the user the command runs as, if overridden.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Return the working directory, if overridden.
    #[must_use]
    pub fn working_dir(&self) -> Option<&str> {
        self.working_dir.as_deref()
    }
}

/// Outcome of a captured command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    exit_code: i64,
    stdout: String,
    stderr: String,
}

impl ExecOutput {
    /// Return command exit code captured from exec inspect.
    #[must_use]
    pub const fn exit_code(&self) -> i64 {
        self.exit_code
    }

    /// Return everything the command wrote to standard output.
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Return everything the command wrote to standard error.
    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Whether the command exited with status zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

impl EngineConnector {
    /// Run a command in a running container and capture its output.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::ExecFailed` when the exec session cannot be
    /// created, started, streamed or inspected. A non-zero exit code is not
    /// an error; callers inspect [`ExecOutput::exit_code`].
    pub async fn exec_capture_async<C: ContainerExecClient + Sync>(
        client: &C,
        request: &ExecRequest,
    ) -> Result<ExecOutput, WfverifyError> {
        let create_result = client
            .create_exec(request.container_id(), build_create_exec_options(request))
            .await
            .map_err(|error| {
                exec_failed(
                    request.container_id(),
                    format!("create exec failed: {error}"),
                )
            })?;

        let exec_id = create_result.id;
        let start_result = client
            .start_exec(&exec_id, Some(build_start_exec_options()))
            .await
            .map_err(|error| {
                exec_failed(
                    request.container_id(),
                    format!("start exec failed: {error}"),
                )
            })?;

        let StartExecResults::Attached { mut output, .. } = start_result else {
            return Err(exec_failed(
                request.container_id(),
                "daemon returned detached start result for captured exec",
            ));
        };

        let (stdout, stderr) = collect_output_async(request.container_id(), &mut output).await?;
        let exit_code = wait_for_exit_code_async(client, request.container_id(), &exec_id).await?;
        tracing::debug!(
            container = request.container_id(),
            command = ?request.command(),
            exit_code,
            "exec finished"
        );

        Ok(ExecOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}

fn build_create_exec_options(request: &ExecRequest) -> CreateExecOptions<String> {
    CreateExecOptions::<String> {
        attach_stdin: Some(false),
        attach_stdout: Some(true),
        attach_stderr: Some(true),
        tty: Some(false),
        cmd: Some(request.command().to_vec()),
        user: request.user().map(String::from),
        working_dir: request.working_dir().map(String::from),
        ..CreateExecOptions::default()
    }
}

const fn build_start_exec_options() -> StartExecOptions {
    StartExecOptions {
        detach: false,
        tty: false,
        output_capacity: None,
    }
}

fn validate_command(command: Vec<String>) -> Result<Vec<String>, WfverifyError> {
    let Some(executable) = command.first() else {
        return Err(WfverifyError::from(ConfigError::MissingRequired {
            field: String::from("command"),
        }));
    };

    if executable.trim().is_empty() {
        return Err(WfverifyError::from(ConfigError::InvalidValue {
            field: String::from("command"),
            reason: String::from("command executable must not be empty"),
        }));
    }

    Ok(command)
}

fn validate_required_field<'a>(field: &str, value: &'a str) -> Result<&'a str, WfverifyError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WfverifyError::from(ConfigError::MissingRequired {
            field: String::from(field),
        }));
    }

    Ok(trimmed)
}

pub(super) fn exec_failed(container_id: &str, message: impl Into<String>) -> WfverifyError {
    WfverifyError::from(ContainerError::ExecFailed {
        container_id: String::from(container_id),
        message: message.into(),
    })
}
