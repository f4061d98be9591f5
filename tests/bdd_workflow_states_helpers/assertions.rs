//! Then-step assertions for workflow state-progression scenarios.

use rstest_bdd_macros::then;
use wfverify::verify::{expect_job_status, expect_system_comment};
use wfverify::workflow::{WorkflowState, WorkflowStatus};

use super::cluster::TESTER;
use super::state::{Failure, WorkflowScenarioState};
use super::steps::{StepResult, block_on, context, parse_state};

fn recorded_failure(state: &WorkflowScenarioState) -> StepResult<Failure> {
    state
        .failure
        .get()
        .ok_or_else(|| String::from("expected the attempted step to fail, but it succeeded"))
}

fn expect_failure(state: &WorkflowScenarioState, expected: &Failure) -> StepResult<()> {
    let failure = recorded_failure(state)?;
    if failure == *expected {
        Ok(())
    } else {
        Err(format!("expected {expected:?}, got {failure:?}"))
    }
}

#[then("verification fails with a timeout")]
fn fails_with_timeout(workflow_scenario_state: &WorkflowScenarioState) -> StepResult<()> {
    match recorded_failure(workflow_scenario_state)? {
        Failure::Timeout { .. } => Ok(()),
        other => Err(format!("expected a timeout, got {other:?}")),
    }
}

#[then("the timeout reports state {state} and status {status}")]
fn timeout_reports_last_observed(
    workflow_scenario_state: &WorkflowScenarioState,
    state: String,
    status: String,
) -> StepResult<()> {
    let expected = format!("(state={state}, status={status})");
    expect_failure(
        workflow_scenario_state,
        &Failure::Timeout {
            last_observed: expected,
        },
    )
}

#[then("verification fails with a {field} mismatch")]
fn fails_with_mismatch(workflow_scenario_state: &WorkflowScenarioState, field: String) -> StepResult<()> {
    expect_failure(workflow_scenario_state, &Failure::Mismatch { field })
}

#[then("verification fails because the driver entry is missing")]
fn fails_with_missing_driver(workflow_scenario_state: &WorkflowScenarioState) -> StepResult<()> {
    expect_failure(workflow_scenario_state, &Failure::DriverNotFound)
}

#[then("verification fails because the workflow is missing")]
fn fails_with_missing_workflow(workflow_scenario_state: &WorkflowScenarioState) -> StepResult<()> {
    expect_failure(workflow_scenario_state, &Failure::WorkflowMissing)
}

#[then("verification fails with a write conflict")]
fn fails_with_conflict(workflow_scenario_state: &WorkflowScenarioState) -> StepResult<()> {
    expect_failure(workflow_scenario_state, &Failure::Conflict)
}

#[then("every tester driver entry is completed")]
fn every_tester_entry_completed(workflow_scenario_state: &WorkflowScenarioState) -> StepResult<()> {
    let snapshot = context(workflow_scenario_state)?
        .cluster
        .current_snapshot()
        .ok_or_else(|| String::from("workflow should still exist"))?;
    for state in WorkflowState::SEQUENCE {
        let entry = snapshot
            .driver(TESTER, state)
            .ok_or_else(|| format!("no tester entry watches {state}"))?;
        if !entry.completed || entry.status != Some(WorkflowStatus::Completed) {
            return Err(format!("tester entry for {state} not completed: {entry:?}"));
        }
    }
    Ok(())
}

#[then("the workflow finishes in {state} with status {status}")]
fn workflow_finishes(
    workflow_scenario_state: &WorkflowScenarioState,
    state: String,
    status: String,
) -> StepResult<()> {
    let expected_state = parse_state(&state)?;
    let Ok(expected_status) = status.parse::<WorkflowStatus>();
    let observed = context(workflow_scenario_state)?
        .cluster
        .observe()
        .ok_or_else(|| String::from("workflow should still exist"))?;
    if observed == (expected_state, expected_status) {
        Ok(())
    } else {
        Err(format!("workflow is at {observed:?}"))
    }
}

#[then("the scheduler reports workflow status {status}")]
fn scheduler_reports_status(
    workflow_scenario_state: &WorkflowScenarioState,
    status: String,
) -> StepResult<()> {
    let context = context(workflow_scenario_state)?;
    let Ok(expected) = status.parse::<WorkflowStatus>();
    block_on(expect_job_status(context.cluster.as_ref(), context.job_id, &expected))?
        .map(|_| ())
        .map_err(|error| error.to_string())
}

#[then("the job's system comment contains {text}")]
fn system_comment_contains(
    workflow_scenario_state: &WorkflowScenarioState,
    text: String,
) -> StepResult<()> {
    let context = context(workflow_scenario_state)?;
    block_on(expect_system_comment(
        context.cluster.as_ref(),
        context.job_id,
        &text,
        context.settings.poll,
    ))?
    .map(|_| ())
    .map_err(|error| error.to_string())
}

#[then("the walk verified {count} states")]
fn walk_verified_states(workflow_scenario_state: &WorkflowScenarioState, count: usize) -> StepResult<()> {
    match workflow_scenario_state.walked.get() {
        Some(walked) if walked == count => Ok(()),
        Some(walked) => Err(format!("expected {count} states, walk verified {walked}")),
        None => Err(String::from("no walk was recorded")),
    }
}

#[then("the workflow no longer exists")]
fn workflow_no_longer_exists(workflow_scenario_state: &WorkflowScenarioState) -> StepResult<()> {
    if context(workflow_scenario_state)?.cluster.workflow_exists() {
        Err(String::from("workflow should have been deleted"))
    } else {
        Ok(())
    }
}

#[then("the last cleanup found nothing to delete")]
fn last_cleanup_found_nothing(workflow_scenario_state: &WorkflowScenarioState) -> StepResult<()> {
    match workflow_scenario_state.cleanup_found_workflow.get() {
        Some(false) => Ok(()),
        Some(true) => Err(String::from("cleanup unexpectedly found a workflow")),
        None => Err(String::from("no cleanup was recorded")),
    }
}

#[then("the driver entries were saved {count} times")]
fn driver_entries_saved(workflow_scenario_state: &WorkflowScenarioState, count: usize) -> StepResult<()> {
    let saves = context(workflow_scenario_state)?.cluster.saves();
    if saves == count {
        Ok(())
    } else {
        Err(format!("expected {count} saves, saw {saves}"))
    }
}
