//! Layered configuration loading.
//!
//! Layers are composed by hand with `MergeComposer` rather than through the
//! derive's `load()`, because the `Cli` owns subcommand parsing and because
//! typed environment variables must fail fast instead of being dropped.
//!
//! Precedence, lowest to highest: `AppConfig::default()`, the configuration
//! file, `WFVERIFY_*` environment variables, CLI flags. The merged verify
//! section is validated before it is returned.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use ortho_config::discovery::ConfigDiscovery;
use ortho_config::serde_json::{self, Map, Value};
use ortho_config::{MergeComposer, toml};

use crate::config::{AppConfig, Cli};
use crate::error::{ConfigError, Result};

#[derive(Clone, Copy)]
enum EnvVarType {
    String,
    Bool,
    U64,
}

struct EnvVarSpec {
    env_var: &'static str,
    /// Location of the value in the merged document, outermost key first.
    path: &'static [&'static str],
    var_type: EnvVarType,
}

const ENV_VAR_SPECS: &[EnvVarSpec] = &[
    EnvVarSpec {
        env_var: "WFVERIFY_ENGINE_SOCKET",
        path: &["engine_socket"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "WFVERIFY_SCHEDULER_CONTAINER",
        path: &["scheduler", "container"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "WFVERIFY_SCHEDULER_USER",
        path: &["scheduler", "user"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "WFVERIFY_SCHEDULER_WORKING_DIR",
        path: &["scheduler", "working_dir"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "WFVERIFY_STORE_NAMESPACE",
        path: &["store", "namespace"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "WFVERIFY_STORE_GROUP",
        path: &["store", "group"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "WFVERIFY_STORE_VERSION",
        path: &["store", "version"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "WFVERIFY_STORE_PLURAL",
        path: &["store", "plural"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "WFVERIFY_STORE_NAME_PREFIX",
        path: &["store", "name_prefix"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "WFVERIFY_VERIFY_DRIVER_ID",
        path: &["verify", "driver_id"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "WFVERIFY_VERIFY_POLL_TIMEOUT_SECS",
        path: &["verify", "poll_timeout_secs"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "WFVERIFY_VERIFY_POLL_INTERVAL_MS",
        path: &["verify", "poll_interval_ms"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "WFVERIFY_VERIFY_CANCEL_GRACE_MS",
        path: &["verify", "cancel_grace_ms"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "WFVERIFY_VERIFY_PURGE_ON_CANCEL",
        path: &["verify", "purge_on_cancel"],
        var_type: EnvVarType::Bool,
    },
];

/// Names of every environment variable the loader reads.
///
/// Tests use this to clear the environment without keeping a second list.
#[must_use]
pub fn env_var_names() -> Vec<&'static str> {
    ENV_VAR_SPECS.iter().map(|spec| spec.env_var).collect()
}

/// Load configuration from every layer using the process environment.
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if `--config` names a missing file,
/// `ConfigError::ParseError` for unreadable or malformed files,
/// `ConfigError::InvalidValue` for unparseable typed environment variables or
/// invalid verify settings, `ConfigError::MissingRequired` for a blank driver
/// id, and `ConfigError::OrthoConfig` if the layers cannot be merged.
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    load_config_with_env(cli, &mockable::DefaultEnv::new())
}

/// Load configuration reading environment variables through `env`.
///
/// Discovery of the configuration file still consults the real environment
/// (`WFVERIFY_CONFIG_PATH`, `HOME`, `XDG_CONFIG_HOME`).
///
/// # Errors
///
/// Returns the same errors as [`load_config`].
pub fn load_config_with_env<E: mockable::Env>(cli: &Cli, env: &E) -> Result<AppConfig> {
    let mut composer = MergeComposer::new();

    let defaults =
        serde_json::to_value(AppConfig::default()).map_err(|e| ConfigError::ParseError {
            message: format!("failed to serialise defaults: {e}"),
        })?;
    composer.push_defaults(defaults);

    if let Some(path) = config_file_path(cli)? {
        tracing::debug!(%path, "loading configuration file");
        composer.push_file(read_config_file(&path)?, Some(path));
    }

    let env_values = collect_env_vars(env)?;
    if !env_values.is_null() {
        composer.push_environment(env_values);
    }

    let cli_overrides = build_cli_overrides(cli);
    if !cli_overrides.is_null() {
        composer.push_cli(cli_overrides);
    }

    let config =
        AppConfig::merge_from_layers(composer.layers()).map_err(ConfigError::OrthoConfig)?;
    config.verify.validate()?;
    Ok(config)
}

/// An explicit `--config` path must exist; otherwise the first discovered
/// candidate that exists is used.
fn config_file_path(cli: &Cli) -> Result<Option<Utf8PathBuf>> {
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.clone().into_std_path_buf(),
            }
            .into());
        }
        return Ok(Some(path.clone()));
    }
    Ok(ConfigDiscovery::builder("wfverify")
        .env_var("WFVERIFY_CONFIG_PATH")
        .config_file_name("config.toml")
        .dotfile_name(".wfverify.toml")
        .build()
        .candidates()
        .into_iter()
        .filter(|p| p.exists())
        .find_map(|p| Utf8PathBuf::try_from(p).ok()))
}

/// Read a TOML file through a capability handle on its parent directory.
fn read_config_file(path: &Utf8Path) -> Result<Value> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path.file_name().unwrap_or(path.as_str());

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|e| {
        ConfigError::ParseError {
            message: format!("failed to open directory {parent}: {e}"),
        }
    })?;
    let content = dir
        .read_to_string(file_name)
        .map_err(|e| ConfigError::ParseError {
            message: format!("failed to read {path}: {e}"),
        })?;

    Ok(toml::from_str::<Value>(&content).map_err(|e| ConfigError::ParseError {
        message: format!("failed to parse {path}: {e}"),
    })?)
}

fn parse_env_value(spec: &EnvVarSpec, raw: String) -> Result<Value> {
    let invalid = |expected: &str, raw_value: &str| ConfigError::InvalidValue {
        field: String::from(spec.env_var),
        reason: format!("expected {expected}, got '{raw_value}'"),
    };
    match spec.var_type {
        EnvVarType::String => Ok(Value::String(raw)),
        EnvVarType::Bool => raw
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| invalid("bool (true/false)", &raw).into()),
        EnvVarType::U64 => raw
            .parse::<u64>()
            .map(|n| Value::Number(n.into()))
            .map_err(|_| invalid("unsigned integer", &raw).into()),
    }
}

pub(super) fn collect_env_vars<E: mockable::Env>(env: &E) -> Result<Value> {
    let mut root = Map::new();
    for spec in ENV_VAR_SPECS {
        if let Some(raw) = env.string(spec.env_var) {
            insert_at_path(&mut root, spec.path, parse_env_value(spec, raw)?);
        }
    }

    Ok(if root.is_empty() {
        Value::Null
    } else {
        Value::Object(root)
    })
}

fn insert_at_path(root: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((&field, parents)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for &segment in parents {
        let entry = current
            .entry(String::from(segment))
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(obj) = entry.as_object_mut() else {
            return;
        };
        current = obj;
    }
    current.insert(String::from(field), value);
}

pub(super) fn build_cli_overrides(cli: &Cli) -> Value {
    let mut overrides = Map::new();

    if let Some(ref socket) = cli.engine_socket {
        insert_at_path(&mut overrides, &["engine_socket"], Value::String(socket.clone()));
    }
    if let Some(ref driver_id) = cli.driver_id {
        insert_at_path(
            &mut overrides,
            &["verify", "driver_id"],
            Value::String(driver_id.clone()),
        );
    }

    if overrides.is_empty() {
        Value::Null
    } else {
        Value::Object(overrides)
    }
}
