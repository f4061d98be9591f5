//! Workflow resource store.
//!
//! [`WorkflowStore`] is the seam between the verification core and wherever
//! workflow resources live. [`KubeWorkflowStore`] implements it against the
//! Kubernetes API; tests substitute mocks or in-memory fakes.

mod kubernetes;

use std::future::Future;
use std::pin::Pin;

pub use self::kubernetes::KubeWorkflowStore;
use crate::error::StoreError;
use crate::workflow::{JobId, StatusSnapshot};

/// Boxed future type returned by [`WorkflowStore`] implementors.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Read, conditionally write, and delete the workflow resource of a job.
pub trait WorkflowStore {
    /// Read the workflow's current status in one request.
    ///
    /// Fails with [`StoreError::NotFound`] if the resource does not exist.
    fn get(&self, job_id: JobId) -> StoreFuture<'_, StatusSnapshot>;

    /// Write `snapshot.drivers` back, conditional on `snapshot.revision`.
    ///
    /// Fails with [`StoreError::Conflict`] if the resource changed since the
    /// snapshot was read.
    fn put_drivers(&self, job_id: JobId, snapshot: &StatusSnapshot) -> StoreFuture<'_, ()>;

    /// Delete the workflow resource.
    ///
    /// Fails with [`StoreError::NotFound`] if it is already gone.
    fn delete(&self, job_id: JobId) -> StoreFuture<'_, ()>;
}
