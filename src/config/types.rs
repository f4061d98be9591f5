//! Configuration data types for wfverify.

use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Where scheduler commands run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Name or ID of the container running the Slurm controller.
    pub container: String,

    /// User the scheduler commands run as.
    pub user: String,

    /// Working directory for scheduler commands.
    pub working_dir: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            container: String::from("slurmctld"),
            user: String::from("slurm"),
            working_dir: String::from("/jobs"),
        }
    }
}

/// Where workflow resources live.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Namespace holding the workflow resources.
    pub namespace: String,

    /// API group of the workflow resource.
    pub group: String,

    /// API version of the workflow resource.
    pub version: String,

    /// Plural resource name used in API paths.
    pub plural: String,

    /// Prefix joined to the job id to form the resource name.
    pub name_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: String::from("default"),
            group: String::from("dws.cray.hpe.com"),
            version: String::from("v1alpha1"),
            plural: String::from("workflows"),
            name_prefix: String::from("bb"),
        }
    }
}

/// Verification timing and identity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Driver identity the harness acknowledges entries for.
    pub driver_id: String,

    /// Upper bound on any single wait, in seconds.
    pub poll_timeout_secs: u64,

    /// Pause between fetches while waiting, in milliseconds.
    pub poll_interval_ms: u64,

    /// Pause after cancelling a job before verification resumes, in
    /// milliseconds. Tuned to the controller's poll cadence.
    pub cancel_grace_ms: u64,

    /// Skip the job's data stage-out when cancelling.
    pub purge_on_cancel: bool,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            driver_id: String::from("tester"),
            poll_timeout_secs: 60,
            poll_interval_ms: 1000,
            cancel_grace_ms: 2000,
            purge_on_cancel: false,
        }
    }
}

impl VerifyConfig {
    /// Checks the values are usable for polling.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired` for a blank `driver_id` and
    /// `ConfigError::InvalidValue` for a zero timeout or interval, or an
    /// interval longer than the timeout.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.driver_id.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: String::from("verify.driver_id"),
            }
            .into());
        }
        if self.poll_timeout_secs == 0 {
            return Err(invalid("verify.poll_timeout_secs", "must be greater than zero"));
        }
        if self.poll_interval_ms == 0 {
            return Err(invalid("verify.poll_interval_ms", "must be greater than zero"));
        }
        if self.poll_interval() > self.poll_timeout() {
            return Err(invalid(
                "verify.poll_interval_ms",
                "must not exceed verify.poll_timeout_secs",
            ));
        }
        Ok(())
    }

    /// The wait budget as a `Duration`.
    #[must_use]
    pub const fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    /// The poll interval as a `Duration`.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The post-cancellation grace delay as a `Duration`.
    #[must_use]
    pub const fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }
}

fn invalid(field: &str, reason: &str) -> crate::error::WfverifyError {
    ConfigError::InvalidValue {
        field: String::from(field),
        reason: String::from(reason),
    }
    .into()
}

/// Root application configuration.
///
/// Loaded from configuration files, environment variables and command-line
/// arguments. Precedence, lowest to highest: defaults, configuration file,
/// environment variables, command-line arguments.
///
/// Configuration files are discovered in this order:
/// 1. Path specified via `WFVERIFY_CONFIG_PATH` environment variable
/// 2. `.wfverify.toml` in the current working directory
/// 3. `.wfverify.toml` in the home directory
/// 4. `~/.config/wfverify/config.toml` (XDG default)
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "WFVERIFY",
    post_merge_hook,
    discovery(
        app_name = "wfverify",
        env_var = "WFVERIFY_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".wfverify.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct AppConfig {
    /// The container engine socket path or URL.
    pub engine_socket: Option<String>,

    /// Scheduler container configuration.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub scheduler: SchedulerConfig,

    /// Workflow resource configuration.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub store: StoreConfig,

    /// Verification configuration.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub verify: VerifyConfig,
}

impl AppConfig {
    /// Strip surrounding whitespace from names and identifiers.
    pub fn trim_identifiers(&mut self) {
        for value in [
            &mut self.scheduler.container,
            &mut self.scheduler.user,
            &mut self.scheduler.working_dir,
            &mut self.store.namespace,
            &mut self.store.name_prefix,
            &mut self.verify.driver_id,
        ] {
            *value = String::from(value.trim());
        }
    }
}

impl PostMergeHook for AppConfig {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        self.trim_identifiers();
        Ok(())
    }
}
