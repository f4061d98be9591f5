//! Output collection and exit-code polling for captured exec sessions.

use std::pin::Pin;
use std::time::Duration;

use bollard::container::LogOutput;
use bollard::errors::Error as BollardError;
use futures_util::{Stream, StreamExt};
use tokio::time::sleep;

use super::{ContainerExecClient, EXEC_INSPECT_POLL_INTERVAL_MS, exec_failed};
use crate::error::WfverifyError;

type OutputStream = Pin<Box<dyn Stream<Item = Result<LogOutput, BollardError>> + Send>>;

/// Drain the attached output stream into `(stdout, stderr)`.
///
/// Console frames arrive when the daemon multiplexes without a TTY header;
/// they are treated as standard output.
pub(super) async fn collect_output_async(
    container_id: &str,
    output: &mut OutputStream,
) -> Result<(String, String), WfverifyError> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    while let Some(chunk_result) = output.next().await {
        let chunk = chunk_result
            .map_err(|error| exec_failed(container_id, format!("exec stream failed: {error}")))?;
        match chunk {
            LogOutput::StdOut { message } | LogOutput::Console { message } => {
                stdout.extend_from_slice(&message);
            }
            LogOutput::StdErr { message } => stderr.extend_from_slice(&message),
            LogOutput::StdIn { .. } => {}
        }
    }

    Ok((
        String::from_utf8_lossy(&stdout).into_owned(),
        String::from_utf8_lossy(&stderr).into_owned(),
    ))
}

pub(super) async fn wait_for_exit_code_async<C: ContainerExecClient>(
    client: &C,
    container_id: &str,
    exec_id: &str,
) -> Result<i64, WfverifyError> {
    loop {
        let inspect = client
            .inspect_exec(exec_id)
            .await
            .map_err(|error| exec_failed(container_id, format!("inspect exec failed: {error}")))?;

        if inspect.running.unwrap_or(false) {
            sleep(Duration::from_millis(EXEC_INSPECT_POLL_INTERVAL_MS)).await;
            continue;
        }

        if let Some(exit_code) = inspect.exit_code {
            return Ok(exit_code);
        }

        return Err(exec_failed(
            container_id,
            format!("exec session '{exec_id}' completed without an exit code"),
        ));
    }
}
