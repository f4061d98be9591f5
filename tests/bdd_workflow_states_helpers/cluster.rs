//! In-process stand-in for the workflow controller and the scheduler.
//!
//! Every resource read lets the fake controller take one step: a `Pending`
//! state moves to `DriverWait` (or `Error` where a driver failure is
//! scripted), and a `DriverWait` state whose driver entries are all
//! completed moves on to the next state. Scheduler reads mirror the
//! controller without advancing it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use wfverify::error::{SchedulerError, StoreError};
use wfverify::scheduler::{JobRecord, JobStatus, SchedulerClient, SchedulerFuture};
use wfverify::store::{StoreFuture, WorkflowStore};
use wfverify::workflow::{DriverEntry, JobId, StatusSnapshot, WorkflowState, WorkflowStatus};

pub(crate) const TESTER: &str = "tester";
const COMPUTE_DRIVER: &str = "compute";

#[derive(Debug, Clone)]
struct Workflow {
    state: WorkflowState,
    status: WorkflowStatus,
    drivers: Vec<DriverEntry>,
    revision: u64,
}

impl Workflow {
    fn new() -> Self {
        let mut drivers = Vec::new();
        for state in WorkflowState::SEQUENCE {
            drivers.push(DriverEntry::pending(TESTER, state));
            if state == WorkflowState::DataIn {
                drivers.push(DriverEntry::pending(COMPUTE_DRIVER, state));
            }
        }
        Self {
            state: WorkflowState::Proposal,
            status: WorkflowStatus::Pending,
            drivers,
            revision: 1,
        }
    }

    fn enter(&mut self, state: WorkflowState, status: WorkflowStatus) {
        self.state = state;
        self.status = status;
        self.revision = self.revision.saturating_add(1);
    }

    fn drivers_done(&self) -> bool {
        self.drivers
            .iter()
            .filter(|entry| entry.watch_state.contains(self.state))
            .all(|entry| entry.completed)
    }

    fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: Some(self.state),
            status: Some(self.status.clone()),
            drivers: self.drivers.clone(),
            revision: Some(self.revision.to_string()),
        }
    }
}

#[derive(Debug, Default)]
struct ClusterState {
    job_id: Option<JobId>,
    workflow: Option<Workflow>,
    error_at: Option<WorkflowState>,
    stall_at: Option<WorkflowState>,
    scheduler_lags: bool,
    interfere_on_save: bool,
    cancelled: bool,
    finished: bool,
    system_comment: String,
    saves: usize,
}

impl ClusterState {
    fn tick(&mut self) {
        let Some(workflow) = self.workflow.as_mut() else {
            return;
        };

        if self.cancelled && workflow.state != WorkflowState::Teardown {
            workflow.enter(WorkflowState::Teardown, WorkflowStatus::Error);
            return;
        }

        let status = workflow.status.clone();
        match status {
            WorkflowStatus::Pending if self.stall_at == Some(workflow.state) => {}
            WorkflowStatus::Pending if self.error_at == Some(workflow.state) => {
                self.system_comment =
                    format!("Error in state {}: TEST_ERROR from {TESTER}", workflow.state);
                workflow.enter(workflow.state, WorkflowStatus::Error);
            }
            WorkflowStatus::Pending => {
                let state = workflow.state;
                for entry in &mut workflow.drivers {
                    if entry.driver_id != TESTER
                        && entry.watch_state.contains(state)
                        && entry.status == Some(WorkflowStatus::Pending)
                    {
                        entry.mark_completed();
                    }
                }
                workflow.enter(state, WorkflowStatus::DriverWait);
            }
            WorkflowStatus::DriverWait if workflow.drivers_done() => match workflow.state.next() {
                Some(next) => workflow.enter(next, WorkflowStatus::Pending),
                None => {
                    workflow.enter(WorkflowState::Teardown, WorkflowStatus::Completed);
                    self.finished = true;
                }
            },
            _ => {}
        }
    }

    fn existing(&mut self, job_id: JobId) -> Result<&mut Workflow, StoreError> {
        if self.job_id != Some(job_id) {
            return Err(not_found(job_id));
        }
        self.workflow.as_mut().ok_or_else(|| not_found(job_id))
    }
}

fn workflow_name(job_id: JobId) -> String {
    format!("bb{job_id}")
}

fn not_found(job_id: JobId) -> StoreError {
    StoreError::NotFound {
        name: workflow_name(job_id),
    }
}

/// Fake controller, resource store, and scheduler sharing one workflow.
#[derive(Debug, Default)]
pub(crate) struct FakeCluster {
    inner: Mutex<ClusterState>,
}

impl FakeCluster {
    fn lock(&self) -> MutexGuard<'_, ClusterState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn create_workflow(&self, job_id: JobId) {
        let mut cluster = self.lock();
        cluster.job_id = Some(job_id);
        cluster.workflow = Some(Workflow::new());
    }

    pub(crate) fn raise_driver_error_at(&self, state: WorkflowState) {
        self.lock().error_at = Some(state);
    }

    pub(crate) fn stall_at(&self, state: WorkflowState) {
        self.lock().stall_at = Some(state);
    }

    pub(crate) fn lag_scheduler(&self) {
        self.lock().scheduler_lags = true;
    }

    pub(crate) fn interfere_on_save(&self) {
        self.lock().interfere_on_save = true;
    }

    pub(crate) fn unregister_tester(&self, state: WorkflowState) {
        if let Some(workflow) = self.lock().workflow.as_mut() {
            workflow
                .drivers
                .retain(|entry| !(entry.driver_id == TESTER && entry.watch_state.contains(state)));
        }
    }

    /// Read the workflow as the store would return it, without a controller
    /// step.
    pub(crate) fn current_snapshot(&self) -> Option<StatusSnapshot> {
        self.lock().workflow.as_ref().map(Workflow::snapshot)
    }

    /// Let the controller take one step, then report where the workflow is.
    pub(crate) fn observe(&self) -> Option<(WorkflowState, WorkflowStatus)> {
        let mut cluster = self.lock();
        cluster.tick();
        cluster
            .workflow
            .as_ref()
            .map(|workflow| (workflow.state, workflow.status.clone()))
    }

    pub(crate) fn workflow_exists(&self) -> bool {
        self.lock().workflow.is_some()
    }

    pub(crate) fn saves(&self) -> usize {
        self.lock().saves
    }
}

impl WorkflowStore for FakeCluster {
    fn get(&self, job_id: JobId) -> StoreFuture<'_, StatusSnapshot> {
        let mut cluster = self.lock();
        cluster.tick();
        let read = cluster.existing(job_id).map(|workflow| workflow.snapshot());
        Box::pin(async move { read })
    }

    fn put_drivers(&self, job_id: JobId, snapshot: &StatusSnapshot) -> StoreFuture<'_, ()> {
        let mut cluster = self.lock();
        let interfere = cluster.interfere_on_save;
        let name = workflow_name(job_id);
        let written = cluster.existing(job_id).and_then(|workflow| {
            if interfere {
                workflow.revision = workflow.revision.saturating_add(1);
            }
            let current = workflow.revision.to_string();
            if snapshot.revision.as_deref() != Some(current.as_str()) {
                return Err(StoreError::Conflict {
                    name,
                    revision: snapshot.revision.clone().unwrap_or_default(),
                });
            }
            workflow.drivers.clone_from(&snapshot.drivers);
            workflow.revision = workflow.revision.saturating_add(1);
            Ok(())
        });
        if written.is_ok() {
            cluster.saves = cluster.saves.saturating_add(1);
        }
        Box::pin(async move { written })
    }

    fn delete(&self, job_id: JobId) -> StoreFuture<'_, ()> {
        let mut cluster = self.lock();
        let removed = cluster.existing(job_id).map(|_| ());
        if removed.is_ok() {
            cluster.workflow = None;
        }
        Box::pin(async move { removed })
    }
}

impl SchedulerClient for FakeCluster {
    fn job_status(&self, job_id: JobId) -> SchedulerFuture<'_, JobStatus> {
        let mut cluster = self.lock();
        let lags = cluster.scheduler_lags;
        let status = cluster
            .existing(job_id)
            .map(|workflow| {
                let current_state = if lags {
                    WorkflowState::SEQUENCE
                        .into_iter()
                        .take_while(|state| *state < workflow.state)
                        .last()
                        .unwrap_or(workflow.state)
                } else {
                    workflow.state
                };
                JobStatus {
                    desired_state: workflow.state,
                    current_state,
                    status: workflow.status.clone(),
                }
            })
            .map_err(|error| SchedulerError::CommandFailed {
                command: format!("scontrol show bbstat workflow {job_id}"),
                exit_code: 1,
                stderr: error.to_string(),
            });
        Box::pin(async move { status })
    }

    fn cancel_job(&self, _job_id: JobId, _purge: bool) -> SchedulerFuture<'_, ()> {
        self.lock().cancelled = true;
        Box::pin(async { Ok(()) })
    }

    fn job_record(&self, _job_id: JobId) -> SchedulerFuture<'_, JobRecord> {
        let cluster = self.lock();
        let job_state = if cluster.cancelled {
            "CANCELLED"
        } else if cluster.finished {
            "COMPLETED"
        } else {
            "RUNNING"
        };
        let record = JobRecord {
            job_state: String::from(job_state),
            exit_code: Some(String::from(if cluster.cancelled { "0:15" } else { "0:0" })),
            system_comment: cluster.system_comment.clone(),
        };
        Box::pin(async move { Ok(record) })
    }

    fn submit_job(&self, _script: &str) -> SchedulerFuture<'_, JobId> {
        let job_id = JobId::new(7);
        self.create_workflow(job_id);
        Box::pin(async move { Ok(job_id) })
    }
}
