//! Scenario-scoped access to one workflow resource.

use crate::error::{Result, StoreError, VerifyError};
use crate::store::WorkflowStore;
use crate::workflow::{JobId, StatusSnapshot};

/// A workflow resource known to exist when the handle was acquired.
pub struct WorkflowHandle<'a, S> {
    store: &'a S,
    job_id: JobId,
}

impl<'a, S: WorkflowStore> WorkflowHandle<'a, S> {
    /// Bind to the workflow for `job_id`.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::WorkflowMissing` if the resource does not exist,
    /// or the store's error for any other read failure.
    pub async fn acquire(store: &'a S, job_id: JobId) -> Result<Self> {
        match store.get(job_id).await {
            Ok(_) => Ok(Self { store, job_id }),
            Err(StoreError::NotFound { .. }) => Err(VerifyError::WorkflowMissing { job_id }.into()),
            Err(error) => Err(error.into()),
        }
    }

    /// The job this handle is bound to.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Read the resource's current status.
    ///
    /// # Errors
    ///
    /// Propagates store failures, including `StoreError::NotFound` if the
    /// resource has since been removed.
    pub async fn fetch(&self) -> Result<StatusSnapshot> {
        Ok(self.store.get(self.job_id).await?)
    }

    /// Write the snapshot's driver entries back.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the resource changed after
    /// `snapshot` was read. The write is not retried.
    pub async fn save_driver_statuses(&self, snapshot: &StatusSnapshot) -> Result<()> {
        Ok(self.store.put_drivers(self.job_id, snapshot).await?)
    }

    /// Delete the resource. A resource that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Propagates any other store failure.
    pub async fn delete(&self) -> Result<()> {
        match self.store.delete(self.job_id).await {
            Ok(()) | Err(StoreError::NotFound { .. }) => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    /// Delete the resource, then return `outcome` unchanged.
    ///
    /// Cleanup failures are logged and never replace the outcome.
    pub async fn release<T>(self, outcome: Result<T>) -> Result<T> {
        if let Err(error) = self.delete().await {
            tracing::warn!(job_id = %self.job_id, %error, "workflow cleanup failed");
        }
        outcome
    }
}

