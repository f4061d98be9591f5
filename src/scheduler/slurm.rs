//! Slurm adapter that runs scheduler commands inside the controller container.

use crate::config::SchedulerConfig;
use crate::engine::{ContainerExecClient, EngineConnector, ExecRequest};
use crate::error::SchedulerError;
use crate::workflow::JobId;

use super::parse::{parse_job_record, parse_submitted_job_id, parse_workflow_status};
use super::{JobRecord, JobStatus, SchedulerClient, SchedulerFuture};

/// Scheduler client that execs `scontrol`, `scancel` and `sbatch` in the
/// Slurm controller container.
pub struct SlurmctldScheduler<C> {
    client: C,
    container: String,
    user: String,
    working_dir: String,
}

impl<C: ContainerExecClient + Sync> SlurmctldScheduler<C> {
    /// Build a scheduler client over an engine connection.
    #[must_use]
    pub fn new(client: C, config: &SchedulerConfig) -> Self {
        Self {
            client,
            container: config.container.clone(),
            user: config.user.clone(),
            working_dir: config.working_dir.clone(),
        }
    }

    /// Run `argv` and return its standard output.
    async fn run(&self, argv: Vec<String>) -> Result<String, SchedulerError> {
        let command = argv.join(" ");
        let unreachable = |message: String| SchedulerError::Unreachable {
            command: command.clone(),
            message,
        };

        let request = ExecRequest::new(self.container.as_str(), argv)
            .map_err(|error| unreachable(error.to_string()))?
            .with_user(Some(self.user.clone()))
            .with_working_dir(Some(self.working_dir.clone()));
        let output = EngineConnector::exec_capture_async(&self.client, &request)
            .await
            .map_err(|error| unreachable(error.to_string()))?;

        if !output.succeeded() {
            return Err(SchedulerError::CommandFailed {
                command,
                exit_code: output.exit_code(),
                stderr: String::from(output.stderr().trim()),
            });
        }
        tracing::trace!(%command, stdout = output.stdout(), "scheduler command succeeded");
        Ok(String::from(output.stdout()))
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| String::from(*part)).collect()
}

impl<C: ContainerExecClient + Sync> SchedulerClient for SlurmctldScheduler<C> {
    fn job_status(&self, job_id: JobId) -> SchedulerFuture<'_, JobStatus> {
        let job = job_id.to_string();
        Box::pin(async move {
            let command = argv(&["scontrol", "show", "bbstat", "workflow", &job]);
            let label = command.join(" ");
            let stdout = self.run(command).await?;
            parse_workflow_status(&label, &stdout)
        })
    }

    fn cancel_job(&self, job_id: JobId, purge: bool) -> SchedulerFuture<'_, ()> {
        let job = job_id.to_string();
        Box::pin(async move {
            let command = if purge {
                argv(&["scancel", "--hurry", &job])
            } else {
                argv(&["scancel", &job])
            };
            self.run(command).await?;
            Ok(())
        })
    }

    fn job_record(&self, job_id: JobId) -> SchedulerFuture<'_, JobRecord> {
        let job = job_id.to_string();
        Box::pin(async move {
            let command = argv(&["scontrol", "show", "job", &job]);
            let label = command.join(" ");
            let stdout = self.run(command).await?;
            parse_job_record(&label, &stdout)
        })
    }

    fn submit_job(&self, script: &str) -> SchedulerFuture<'_, JobId> {
        let script_path = String::from(script);
        Box::pin(async move {
            let command = argv(&["sbatch", "--parsable", &script_path]);
            let label = command.join(" ");
            let stdout = self.run(command).await?;
            parse_submitted_job_id(&label, &stdout)
        })
    }
}
