//! Given/When steps for workflow state-progression scenarios.

use std::future::Future;
use std::sync::Arc;

use rstest_bdd_macros::{given, when};
use wfverify::api::{Command, CommandOutcome, run_command};
use wfverify::error::Result as WfverifyResult;
use wfverify::verify::{
    ErrorTransitionVerifier, TransitionVerifier, VerifySettings, WorkflowHandle, cancel_job, walk,
};
use wfverify::workflow::{JobId, WorkflowState};

use super::cluster::FakeCluster;
use super::state::{Failure, WorkflowScenarioState};

pub type StepResult<T> = Result<T, String>;

pub(crate) struct Context {
    pub(crate) cluster: Arc<FakeCluster>,
    pub(crate) job_id: JobId,
    pub(crate) settings: VerifySettings,
}

pub(crate) fn context(state: &WorkflowScenarioState) -> StepResult<Context> {
    Ok(Context {
        cluster: state
            .cluster
            .get()
            .ok_or_else(|| String::from("cluster should be configured"))?,
        job_id: state
            .job_id
            .get()
            .ok_or_else(|| String::from("job id should be configured"))?,
        settings: state
            .settings
            .get()
            .ok_or_else(|| String::from("settings should be configured"))?,
    })
}

pub(crate) fn parse_state(value: &str) -> StepResult<WorkflowState> {
    value
        .parse::<WorkflowState>()
        .map_err(|error| error.to_string())
}

pub(crate) fn block_on<F: Future>(future: F) -> StepResult<F::Output> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|error| format!("failed to create tokio runtime: {error}"))?;
    Ok(runtime.block_on(future))
}

async fn advance(context: &Context, target: WorkflowState) -> WfverifyResult<()> {
    let cluster = context.cluster.as_ref();
    let handle = WorkflowHandle::acquire(cluster, context.job_id).await?;
    TransitionVerifier::new(&handle, cluster, &context.settings)
        .advance(target)
        .await?;
    Ok(())
}

async fn expect_error(context: &Context, target: WorkflowState) -> WfverifyResult<()> {
    let cluster = context.cluster.as_ref();
    let handle = WorkflowHandle::acquire(cluster, context.job_id).await?;
    ErrorTransitionVerifier::new(&handle, cluster, &context.settings)
        .expect_error(target)
        .await?;
    Ok(())
}

#[given("a workflow exists for job {job}")]
fn workflow_exists_for_job(workflow_scenario_state: &WorkflowScenarioState, job: u64) -> StepResult<()> {
    let cluster = context(workflow_scenario_state)?.cluster;
    cluster.create_workflow(JobId::new(job));
    workflow_scenario_state.job_id.set(JobId::new(job));
    Ok(())
}

#[given("job {job} has no workflow")]
fn job_has_no_workflow(workflow_scenario_state: &WorkflowScenarioState, job: u64) {
    workflow_scenario_state.job_id.set(JobId::new(job));
}

#[given("a job has been submitted")]
fn job_has_been_submitted(workflow_scenario_state: &WorkflowScenarioState) -> StepResult<()> {
    let context = context(workflow_scenario_state)?;
    let cluster = context.cluster.as_ref();
    let command = Command::Submit {
        script: String::from("/jobs/bb-states.sh"),
    };
    match block_on(run_command(&command, cluster, cluster, &context.settings))? {
        Ok(CommandOutcome::Submitted { job }) => {
            workflow_scenario_state.job_id.set(job);
            Ok(())
        }
        Ok(other) => Err(format!("unexpected outcome: {other}")),
        Err(error) => Err(format!("submission failed: {error}")),
    }
}

#[given("the controller raises a driver error at the {state} state")]
fn controller_raises_driver_error(
    workflow_scenario_state: &WorkflowScenarioState,
    state: String,
) -> StepResult<()> {
    context(workflow_scenario_state)?
        .cluster
        .raise_driver_error_at(parse_state(&state)?);
    Ok(())
}

#[given("the controller stalls at the {state} state")]
fn controller_stalls(workflow_scenario_state: &WorkflowScenarioState, state: String) -> StepResult<()> {
    context(workflow_scenario_state)?
        .cluster
        .stall_at(parse_state(&state)?);
    Ok(())
}

#[given("no tester driver is registered for the {state} state")]
fn no_tester_driver_registered(
    workflow_scenario_state: &WorkflowScenarioState,
    state: String,
) -> StepResult<()> {
    context(workflow_scenario_state)?
        .cluster
        .unregister_tester(parse_state(&state)?);
    Ok(())
}

#[given("the scheduler lags one state behind")]
fn scheduler_lags(workflow_scenario_state: &WorkflowScenarioState) -> StepResult<()> {
    context(workflow_scenario_state)?.cluster.lag_scheduler();
    Ok(())
}

#[given("another writer updates the workflow before each save")]
fn another_writer_interferes(workflow_scenario_state: &WorkflowScenarioState) -> StepResult<()> {
    context(workflow_scenario_state)?.cluster.interfere_on_save();
    Ok(())
}

#[when("the workflow and job progress to the {state} state")]
fn workflow_progresses(workflow_scenario_state: &WorkflowScenarioState, state: String) -> StepResult<()> {
    let context = context(workflow_scenario_state)?;
    let target = parse_state(&state)?;
    block_on(advance(&context, target))?
        .map_err(|error| format!("advance to {target} failed: {error}"))
}

#[when("the workflow and job report errors at the {state} state")]
fn workflow_reports_errors(
    workflow_scenario_state: &WorkflowScenarioState,
    state: String,
) -> StepResult<()> {
    let context = context(workflow_scenario_state)?;
    let target = parse_state(&state)?;
    block_on(expect_error(&context, target))?
        .map_err(|error| format!("expected error at {target}: {error}"))
}

#[when("advancing to the {state} state is attempted")]
fn advancing_is_attempted(
    workflow_scenario_state: &WorkflowScenarioState,
    state: String,
) -> StepResult<()> {
    let context = context(workflow_scenario_state)?;
    let target = parse_state(&state)?;
    if let Err(error) = block_on(advance(&context, target))? {
        workflow_scenario_state.failure.set(Failure::from(&error));
    }
    Ok(())
}

#[when("the job is cancelled")]
fn job_is_cancelled(workflow_scenario_state: &WorkflowScenarioState) -> StepResult<()> {
    let context = context(workflow_scenario_state)?;
    block_on(cancel_job(
        context.cluster.as_ref(),
        context.job_id,
        context.settings.purge_on_cancel,
        &context.settings,
    ))?
    .map_err(|error| format!("cancellation failed: {error}"))
}

#[when("the workflow is walked from {from} to {to}")]
fn workflow_is_walked(
    workflow_scenario_state: &WorkflowScenarioState,
    from: String,
    to: String,
) -> StepResult<()> {
    let context = context(workflow_scenario_state)?;
    let cluster = context.cluster.as_ref();
    let visited = block_on(walk(
        cluster,
        cluster,
        context.job_id,
        parse_state(&from)?,
        parse_state(&to)?,
        &context.settings,
    ))?
    .map_err(|error| format!("walk failed: {error}"))?;
    workflow_scenario_state.walked.set(visited.len());
    Ok(())
}

#[when("the workflow is cleaned up")]
fn workflow_is_cleaned_up(workflow_scenario_state: &WorkflowScenarioState) -> StepResult<()> {
    let context = context(workflow_scenario_state)?;
    let cluster = context.cluster.as_ref();
    let command = Command::Cleanup {
        job: context.job_id,
    };
    match block_on(run_command(&command, cluster, cluster, &context.settings))? {
        Ok(CommandOutcome::CleanedUp { existed, .. }) => {
            workflow_scenario_state.cleanup_found_workflow.set(existed);
            Ok(())
        }
        Ok(other) => Err(format!("unexpected outcome: {other}")),
        Err(error) => Err(format!("cleanup failed: {error}")),
    }
}
