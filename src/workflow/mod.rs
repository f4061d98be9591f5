//! Data model for workflow resources as observed by the harness.
//!
//! A workflow resource moves through a fixed sequence of [`WorkflowState`]s.
//! Within each state the controller reports a [`WorkflowStatus`], and the
//! drivers registered for that state appear as [`DriverEntry`] records. One
//! read of the resource is captured as a [`StatusSnapshot`]; state and status
//! are only ever compared within a single snapshot.

mod snapshot;
mod state;

pub use snapshot::{DriverEntry, JobId, ParseJobIdError, StatusSnapshot, WatchState};
pub use state::{ParseStateError, WorkflowState, WorkflowStatus};
