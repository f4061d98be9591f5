//! Parsers for Slurm command output.

use crate::error::SchedulerError;
use crate::workflow::{JobId, WorkflowState, WorkflowStatus};

use super::{JobRecord, JobStatus};

/// Job states after which the scheduler no longer changes a job.
pub const FINAL_JOB_STATES: &[&str] = &[
    "COMPLETED",
    "CANCELLED",
    "FAILED",
    "TIMEOUT",
    "PREEMPTED",
    "NODE_FAIL",
    "BOOT_FAIL",
    "DEADLINE",
    "OUT_OF_MEMORY",
];

const SYSTEM_COMMENT_KEY: &str = "SystemComment=";

fn fields(output: &str) -> impl Iterator<Item = (&str, &str)> {
    output
        .split_whitespace()
        .filter_map(|token| token.split_once('='))
}

fn field<'a>(output: &'a str, key: &str) -> Option<&'a str> {
    fields(output).find(|(name, _)| *name == key).map(|(_, value)| value)
}

/// Parse `scontrol show bbstat workflow <job>` output.
///
/// # Errors
///
/// Returns `SchedulerError::MalformedOutput` when a key is missing or a state
/// is not recognised.
pub fn parse_workflow_status(command: &str, output: &str) -> Result<JobStatus, SchedulerError> {
    let malformed = |message: String| SchedulerError::MalformedOutput {
        command: String::from(command),
        message,
    };
    let required = |key: &str| {
        field(output, key).ok_or_else(|| malformed(format!("missing '{key}' in '{}'", output.trim())))
    };
    let state = |key: &str| {
        required(key)?
            .parse::<WorkflowState>()
            .map_err(|error| malformed(error.to_string()))
    };

    Ok(JobStatus {
        desired_state: state("desiredState")?,
        current_state: state("currentState")?,
        status: WorkflowStatus::from(String::from(required("status")?)),
    })
}

/// Parse `scontrol show job <job>` output.
///
/// `SystemComment` takes the remainder of its line since comments contain
/// spaces. A missing comment is reported as empty.
///
/// # Errors
///
/// Returns `SchedulerError::MalformedOutput` when `JobState` is absent.
pub fn parse_job_record(command: &str, output: &str) -> Result<JobRecord, SchedulerError> {
    let job_state = field(output, "JobState").ok_or_else(|| SchedulerError::MalformedOutput {
        command: String::from(command),
        message: String::from("missing 'JobState'"),
    })?;

    let system_comment = output
        .lines()
        .find_map(|line| line.split_once(SYSTEM_COMMENT_KEY))
        .map(|(_, comment)| comment.trim_end())
        .unwrap_or_default();

    Ok(JobRecord {
        job_state: String::from(job_state),
        exit_code: field(output, "ExitCode").map(String::from),
        system_comment: String::from(system_comment),
    })
}

/// Parse `sbatch --parsable` output: `<job id>[;<cluster>]`.
///
/// # Errors
///
/// Returns `SchedulerError::MalformedOutput` when no job id can be read.
pub fn parse_submitted_job_id(command: &str, output: &str) -> Result<JobId, SchedulerError> {
    let id_text = output.trim().split(';').next().unwrap_or_default();
    id_text
        .parse::<JobId>()
        .map_err(|error| SchedulerError::MalformedOutput {
            command: String::from(command),
            message: error.to_string(),
        })
}
