//! Workflow states and per-state statuses.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stage in the workflow's fixed state sequence.
///
/// Variants are declared in sequence order, so the derived ordering matches
/// the order in which the controller moves a workflow through its states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorkflowState {
    /// The workflow has been proposed and its directives are being validated.
    Proposal,
    /// Storage and compute resources are being allocated.
    Setup,
    /// Data is staged in ahead of the job running.
    DataIn,
    /// Final preparation immediately before the job runs.
    PreRun,
    /// Clean-up immediately after the job has run.
    PostRun,
    /// Data is staged out after the job has run.
    DataOut,
    /// Resources are released.
    Teardown,
}

impl WorkflowState {
    /// Every state, in sequence order.
    pub const SEQUENCE: [Self; 7] = [
        Self::Proposal,
        Self::Setup,
        Self::DataIn,
        Self::PreRun,
        Self::PostRun,
        Self::DataOut,
        Self::Teardown,
    ];

    /// Return the name the controller and scheduler use for this state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proposal => "Proposal",
            Self::Setup => "Setup",
            Self::DataIn => "DataIn",
            Self::PreRun => "PreRun",
            Self::PostRun => "PostRun",
            Self::DataOut => "DataOut",
            Self::Teardown => "Teardown",
        }
    }

    /// Return the state that follows this one, or `None` after `Teardown`.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Proposal => Some(Self::Setup),
            Self::Setup => Some(Self::DataIn),
            Self::DataIn => Some(Self::PreRun),
            Self::PreRun => Some(Self::PostRun),
            Self::PostRun => Some(Self::DataOut),
            Self::DataOut => Some(Self::Teardown),
            Self::Teardown => None,
        }
    }

    /// Iterate from this state through `last`, inclusive, in sequence order.
    ///
    /// Yields nothing when `last` precedes `self`.
    pub fn through(self, last: Self) -> impl Iterator<Item = Self> {
        Self::SEQUENCE
            .into_iter()
            .filter(move |state| *state >= self && *state <= last)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a workflow state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown workflow state '{value}'")]
pub struct ParseStateError {
    /// The rejected input.
    pub value: String,
}

impl FromStr for WorkflowState {
    type Err = ParseStateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::SEQUENCE
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseStateError {
                value: String::from(value),
            })
    }
}

/// Sub-status reported within a workflow state.
///
/// The controller uses the same vocabulary for the workflow as a whole and for
/// each driver entry. Statuses the harness does not act on are kept verbatim
/// in [`WorkflowStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkflowStatus {
    /// Work for the state has not finished.
    Pending,
    /// The state was entered and the controller waits on driver acknowledgment.
    DriverWait,
    /// Work for the state finished.
    Completed,
    /// A driver reported a fatal error.
    Error,
    /// Any other status string, preserved as reported.
    Other(String),
}

impl WorkflowStatus {
    /// Return the status string as reported by the controller.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::DriverWait => "DriverWait",
            Self::Completed => "Completed",
            Self::Error => "Error",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for WorkflowStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Pending" => Self::Pending,
            "DriverWait" => Self::DriverWait,
            "Completed" => Self::Completed,
            "Error" => Self::Error,
            _ => Self::Other(raw),
        }
    }
}

impl From<WorkflowStatus> for String {
    fn from(status: WorkflowStatus) -> Self {
        match status {
            WorkflowStatus::Other(raw) => raw,
            known => Self::from(known.as_str()),
        }
    }
}

impl FromStr for WorkflowStatus {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(String::from(value.trim())))
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
