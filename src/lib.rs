//! State-transition verification for data workflow resources.
//!
//! `wfverify` acts as a test driver for a workflow controller. A workflow
//! resource moves through a fixed sequence of states; at each one the
//! controller waits for every registered driver to report completion. The
//! harness registers as one of those drivers, waits for each state to be
//! reached, cross-checks the job scheduler's record of the same workflow,
//! and then completes its own driver entry so the controller can advance.
//!
//! # Architecture
//!
//! The verification core in [`verify`] talks to two collaborators through
//! traits: [`store::WorkflowStore`] for the workflow resource and
//! [`scheduler::SchedulerClient`] for the scheduler. Production adapters use
//! the Kubernetes API and Slurm commands run inside the controller
//! container over the container engine connection in [`engine`].
//!
//! # Modules
//!
//! - [`api`]: Library-owned commands and their orchestration
//! - [`config`]: Configuration system with layered precedence (CLI > env > file > defaults)
//! - [`engine`]: Container engine connection and captured command execution
//! - [`error`]: Semantic error types for the application
//! - [`scheduler`]: Scheduler collaborator and Slurm adapter
//! - [`store`]: Workflow resource collaborator and Kubernetes adapter
//! - [`telemetry`]: Log subscriber installation
//! - [`verify`]: Polling, transition verification, and job-level steps
//! - [`workflow`]: States, statuses, and status snapshots

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod store;
pub mod telemetry;
pub mod verify;
pub mod workflow;

#[cfg(test)]
mod test_doubles;
