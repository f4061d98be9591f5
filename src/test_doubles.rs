//! Mock collaborators shared by unit tests.

use bollard::exec::{CreateExecOptions, StartExecOptions};
use mockall::mock;

use crate::engine::{ContainerExecClient, CreateExecFuture, InspectExecFuture, StartExecFuture};
use crate::scheduler::{JobRecord, JobStatus, SchedulerClient, SchedulerFuture};
use crate::store::{StoreFuture, WorkflowStore};
use crate::workflow::{JobId, StatusSnapshot};

mock! {
    #[derive(Debug)]
    pub ExecClient {}

    impl ContainerExecClient for ExecClient {
        fn create_exec(&self, container_id: &str, options: CreateExecOptions<String>) -> CreateExecFuture<'_>;
        fn start_exec(&self, exec_id: &str, options: Option<StartExecOptions>) -> StartExecFuture<'_>;
        fn inspect_exec(&self, exec_id: &str) -> InspectExecFuture<'_>;
    }
}

mock! {
    #[derive(Debug)]
    pub Store {}

    impl WorkflowStore for Store {
        fn get(&self, job_id: JobId) -> StoreFuture<'_, StatusSnapshot>;
        fn put_drivers(&self, job_id: JobId, snapshot: &StatusSnapshot) -> StoreFuture<'_, ()>;
        fn delete(&self, job_id: JobId) -> StoreFuture<'_, ()>;
    }
}

mock! {
    #[derive(Debug)]
    pub Scheduler {}

    impl SchedulerClient for Scheduler {
        fn job_status(&self, job_id: JobId) -> SchedulerFuture<'_, JobStatus>;
        fn cancel_job(&self, job_id: JobId, purge: bool) -> SchedulerFuture<'_, ()>;
        fn job_record(&self, job_id: JobId) -> SchedulerFuture<'_, JobRecord>;
        fn submit_job(&self, script: &str) -> SchedulerFuture<'_, JobId>;
    }
}
