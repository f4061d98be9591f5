//! Shared fixtures and helper functions for config tests.

use std::sync::Arc;

use mockable::MockEnv;
use ortho_config::MergeComposer;
use rstest::fixture;

use crate::config::AppConfig;

/// Fixture providing an `AppConfig` parsed from a full TOML example.
#[fixture]
pub fn app_config_from_full_toml() -> AppConfig {
    let toml = r#"
        engine_socket = "unix:///run/podman/podman.sock"

        [scheduler]
        container = "slurm-controller"
        user = "root"
        working_dir = "/scratch"

        [store]
        namespace = "dws-tests"
        name_prefix = "wf-"

        [verify]
        driver_id = "harness"
        poll_timeout_secs = 120
        poll_interval_ms = 250
        cancel_grace_ms = 5000
        purge_on_cancel = true
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Helper: Creates a `MergeComposer` with the defaults layer pushed.
pub fn create_composer_with_defaults() -> Result<MergeComposer, serde_json::Error> {
    let mut composer = MergeComposer::new();
    let defaults = ortho_config::serde_json::to_value(AppConfig::default())?;
    composer.push_defaults(defaults);
    Ok(composer)
}

/// Helper: Merges layers from a composer into `AppConfig`.
pub fn merge_config(composer: MergeComposer) -> Result<AppConfig, Arc<ortho_config::OrthoError>> {
    AppConfig::merge_from_layers(composer.layers())
}

/// Helper: A `MockEnv` that knows only `vars`.
pub fn env_with(vars: &[(&'static str, &'static str)]) -> MockEnv {
    let owned: Vec<(String, String)> = vars
        .iter()
        .map(|(key, value)| (String::from(*key), String::from(*value)))
        .collect();
    let mut env = MockEnv::new();
    env.expect_string().returning(move |key| {
        owned
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.clone())
    });
    env
}

/// Helper: Asserts that a config has all default values.
pub fn assert_config_has_defaults(config: &AppConfig) {
    assert!(
        config.engine_socket.is_none(),
        "engine_socket should be None"
    );
    assert_eq!(config.scheduler.container, "slurmctld");
    assert_eq!(config.scheduler.user, "slurm");
    assert_eq!(config.scheduler.working_dir, "/jobs");
    assert_eq!(config.store.namespace, "default");
    assert_eq!(config.store.group, "dws.cray.hpe.com");
    assert_eq!(config.store.version, "v1alpha1");
    assert_eq!(config.store.plural, "workflows");
    assert_eq!(config.store.name_prefix, "bb");
    assert_eq!(config.verify.driver_id, "tester");
    assert_eq!(config.verify.poll_timeout_secs, 60);
    assert_eq!(config.verify.poll_interval_ms, 1000);
    assert_eq!(config.verify.cancel_grace_ms, 2000);
    assert!(!config.verify.purge_on_cancel);
}
