//! Kubernetes-backed workflow store.

use kube::api::{Api, DeleteParams, DynamicObject, GroupVersionKind, Patch, PatchParams};
use kube::discovery::ApiResource;
use kube::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{StoreFuture, WorkflowStore};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::workflow::{DriverEntry, JobId, StatusSnapshot, WorkflowState, WorkflowStatus};

const WORKFLOW_KIND: &str = "Workflow";

/// Workflow store backed by the Kubernetes API.
///
/// Workflows are addressed as `<name_prefix><job id>` in a single namespace.
pub struct KubeWorkflowStore {
    api: Api<DynamicObject>,
    name_prefix: String,
}

impl KubeWorkflowStore {
    /// Build a store over an existing client.
    #[must_use]
    pub fn new(client: Client, config: &StoreConfig) -> Self {
        let gvk = GroupVersionKind::gvk(&config.group, &config.version, WORKFLOW_KIND);
        let resource = ApiResource::from_gvk_with_plural(&gvk, &config.plural);
        Self {
            api: Api::namespaced_with(client, &config.namespace, &resource),
            name_prefix: config.name_prefix.clone(),
        }
    }

    /// Build a store using the ambient kubeconfig or in-cluster credentials.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ClientInit` if no usable client configuration is
    /// found.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::try_default()
            .await
            .map_err(|error| StoreError::ClientInit {
                message: error.to_string(),
            })?;
        Ok(Self::new(client, config))
    }

    fn name_for(&self, job_id: JobId) -> String {
        format!("{}{job_id}", self.name_prefix)
    }
}

impl WorkflowStore for KubeWorkflowStore {
    fn get(&self, job_id: JobId) -> StoreFuture<'_, StatusSnapshot> {
        let name = self.name_for(job_id);
        Box::pin(async move {
            let object = self
                .api
                .get(&name)
                .await
                .map_err(|error| classify_api_error(&name, None, &error))?;
            snapshot_from_object(&name, &object)
        })
    }

    fn put_drivers(&self, job_id: JobId, snapshot: &StatusSnapshot) -> StoreFuture<'_, ()> {
        let name = self.name_for(job_id);
        let revision = snapshot.revision.clone();
        let patch = driver_patch(snapshot);
        Box::pin(async move {
            let body = patch.map_err(|error| StoreError::MalformedStatus {
                name: name.clone(),
                message: error.to_string(),
            })?;
            self.api
                .patch_status(&name, &PatchParams::default(), &Patch::Merge(&body))
                .await
                .map_err(|error| classify_api_error(&name, revision.as_deref(), &error))?;
            Ok(())
        })
    }

    fn delete(&self, job_id: JobId) -> StoreFuture<'_, ()> {
        let name = self.name_for(job_id);
        Box::pin(async move {
            self.api
                .delete(&name, &DeleteParams::default())
                .await
                .map_err(|error| classify_api_error(&name, None, &error))?;
            Ok(())
        })
    }
}

/// The parts of a workflow's `.status` block the harness reads.
#[derive(Debug, Default, Deserialize)]
struct RawWorkflowStatus {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    drivers: Option<Vec<DriverEntry>>,
}

/// Convert a fetched workflow object into a snapshot.
///
/// A missing or null status block means the controller has not reported yet.
pub(super) fn snapshot_from_object(
    name: &str,
    object: &DynamicObject,
) -> Result<StatusSnapshot, StoreError> {
    let malformed = |message: String| StoreError::MalformedStatus {
        name: String::from(name),
        message,
    };

    let raw = match object.data.get("status") {
        None | Some(Value::Null) => RawWorkflowStatus::default(),
        Some(status) => serde_json::from_value::<RawWorkflowStatus>(status.clone())
            .map_err(|error| malformed(error.to_string()))?,
    };

    let state = raw
        .state
        .filter(|value| !value.is_empty())
        .map(|value| value.parse::<WorkflowState>())
        .transpose()
        .map_err(|error| malformed(error.to_string()))?;
    let status = raw
        .status
        .filter(|value| !value.is_empty())
        .map(WorkflowStatus::from);

    Ok(StatusSnapshot {
        state,
        status,
        drivers: raw.drivers.unwrap_or_default(),
        revision: object.metadata.resource_version.clone(),
    })
}

/// Build the merge patch that writes driver entries back.
///
/// Including `metadata.resourceVersion` makes the API server reject the patch
/// with a conflict if the workflow changed after the snapshot was read.
pub(super) fn driver_patch(snapshot: &StatusSnapshot) -> Result<Value, serde_json::Error> {
    let drivers = serde_json::to_value(&snapshot.drivers)?;
    let mut body = json!({ "status": { "drivers": drivers } });
    if let (Some(revision), Some(object)) = (snapshot.revision.as_ref(), body.as_object_mut()) {
        object.insert(
            String::from("metadata"),
            json!({ "resourceVersion": revision }),
        );
    }
    Ok(body)
}

pub(super) fn classify_api_error(
    name: &str,
    revision: Option<&str>,
    error: &kube::Error,
) -> StoreError {
    match error {
        kube::Error::Api(response) if response.code == 404 => StoreError::NotFound {
            name: String::from(name),
        },
        kube::Error::Api(response) if response.code == 409 => StoreError::Conflict {
            name: String::from(name),
            revision: String::from(revision.unwrap_or("<unknown>")),
        },
        other => StoreError::RequestFailed {
            name: String::from(name),
            message: other.to_string(),
        },
    }
}
