//! Configuration system for wfverify.
//!
//! Configuration loading and precedence merging is handled by the
//! `ortho_config` crate. CLI flags override environment variables, which
//! override configuration files, which override defaults.
//!
//! The configuration file is expected at `~/.config/wfverify/config.toml` by
//! default.
//!
//! # Example Configuration
//!
//! ```toml
//! engine_socket = "unix:///var/run/docker.sock"
//!
//! [scheduler]
//! container = "slurmctld"
//! user = "slurm"
//! working_dir = "/jobs"
//!
//! [store]
//! namespace = "default"
//! group = "dws.cray.hpe.com"
//! version = "v1alpha1"
//! plural = "workflows"
//! name_prefix = "bb"
//!
//! [verify]
//! driver_id = "tester"
//! poll_timeout_secs = 60
//! poll_interval_ms = 1000
//! cancel_grace_ms = 2000
//! purge_on_cancel = false
//! ```

mod cli;
mod loader;
mod types;


pub use cli::{
    CancelArgs, Cli, Commands, CommentArgs, JobArgs, StateArgs, StatusArgs, SubmitArgs, WalkArgs,
};
pub use loader::{env_var_names, load_config, load_config_with_env};
pub use types::{AppConfig, SchedulerConfig, StoreConfig, VerifyConfig};
