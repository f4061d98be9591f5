//! Job identity, driver entries, and point-in-time status snapshots.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::{WorkflowState, WorkflowStatus};

/// Scheduler job identifier, which also names the job's workflow resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Wrap a raw scheduler job number.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the raw scheduler job number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a string is not a valid job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid job id '{value}'")]
pub struct ParseJobIdError {
    /// The rejected input.
    pub value: String,
}

impl FromStr for JobId {
    type Err = ParseJobIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ParseJobIdError {
                value: String::from(value),
            })
    }
}

/// The state or states a driver entry acts on.
///
/// The controller normally writes a single state name; a list is accepted as
/// well. Either shape is written back exactly as it was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WatchState {
    /// A single watched state.
    Single(WorkflowState),
    /// Several watched states.
    Many(Vec<WorkflowState>),
}

impl WatchState {
    /// Return whether `state` is watched.
    #[must_use]
    pub fn contains(&self, state: WorkflowState) -> bool {
        match self {
            Self::Single(watched) => *watched == state,
            Self::Many(watched) => watched.contains(&state),
        }
    }
}

/// One driver registration inside a workflow's status block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverEntry {
    /// Identity of the driver that owns this entry.
    #[serde(rename = "driverID")]
    pub driver_id: String,

    /// States this entry acts on.
    pub watch_state: WatchState,

    /// Progress reported for this entry. Absent until the controller first
    /// reports on it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowStatus>,

    /// Flag a driver sets to let the controller advance.
    #[serde(default)]
    pub completed: bool,

    /// Fields the harness does not interpret, kept for write-back.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DriverEntry {
    /// Create a pending entry for `driver_id` watching a single state.
    #[must_use]
    pub fn pending(driver_id: impl Into<String>, state: WorkflowState) -> Self {
        Self {
            driver_id: driver_id.into(),
            watch_state: WatchState::Single(state),
            status: Some(WorkflowStatus::Pending),
            completed: false,
            extra: Map::new(),
        }
    }

    /// Return whether this entry is `driver_id`'s pending work for `state`.
    #[must_use]
    pub fn awaits(&self, driver_id: &str, state: WorkflowState) -> bool {
        self.driver_id == driver_id
            && self.watch_state.contains(state)
            && self.status == Some(WorkflowStatus::Pending)
    }

    /// Record the driver's acknowledgment.
    pub fn mark_completed(&mut self) {
        self.status = Some(WorkflowStatus::Completed);
        self.completed = true;
    }
}

/// One atomic read of a workflow resource's reported status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Current state, or `None` before the controller has reported one.
    pub state: Option<WorkflowState>,

    /// Status within the current state, or `None` before it is reported.
    pub status: Option<WorkflowStatus>,

    /// Driver registrations, in the order the controller listed them.
    pub drivers: Vec<DriverEntry>,

    /// Store revision the snapshot was read at.
    pub revision: Option<String>,
}

impl StatusSnapshot {
    /// Return whether this snapshot reports exactly `state` with `status`.
    #[must_use]
    pub fn is_at(&self, state: WorkflowState, status: &WorkflowStatus) -> bool {
        self.state == Some(state) && self.status.as_ref() == Some(status)
    }

    /// Return the positions of entries that are `driver_id`'s pending work
    /// for `state`, in sequence order.
    #[must_use]
    pub fn pending_driver_positions(&self, driver_id: &str, state: WorkflowState) -> Vec<usize> {
        self.drivers
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.awaits(driver_id, state))
            .map(|(position, _)| position)
            .collect()
    }

    /// Return the entry for `driver_id` watching `state`, whatever its status.
    #[must_use]
    pub fn driver(&self, driver_id: &str, state: WorkflowState) -> Option<&DriverEntry> {
        self.drivers
            .iter()
            .find(|entry| entry.driver_id == driver_id && entry.watch_state.contains(state))
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.map_or("<unset>", WorkflowState::as_str);
        let status = self.status.as_ref().map_or("<unset>", WorkflowStatus::as_str);
        write!(f, "(state={state}, status={status})")
    }
}
