//! Socket resolution and container engine connection.
//!
//! This module resolves the container engine endpoint from configuration,
//! environment variables, and platform defaults, then connects through
//! Bollard.

mod exec;

use std::time::Duration;

use bollard::Docker;

pub use self::exec::{
    ContainerExecClient, CreateExecFuture, ExecOutput, ExecRequest, InspectExecFuture,
    StartExecFuture,
};
use crate::error::{ContainerError, WfverifyError};

/// Environment variable names checked in fallback order after configuration sources.
const FALLBACK_ENV_VARS: &[&str] = &["DOCKER_HOST", "CONTAINER_HOST", "PODMAN_HOST"];

/// Connection timeout in seconds for Docker/Podman API connections.
const CONNECTION_TIMEOUT_SECS: u64 = 120;

/// Timeout in seconds for health check operations.
const HEALTH_CHECK_TIMEOUT_SECS: u64 = 10;

#[cfg(unix)]
const DEFAULT_SOCKET: &str = "unix:///var/run/docker.sock";

#[cfg(windows)]
const DEFAULT_SOCKET: &str = "npipe:////./pipe/docker_engine";

/// Resolves container engine socket endpoints from environment variables.
///
/// `E` is any `mockable::Env`, so tests can substitute a `MockEnv`.
pub struct SocketResolver<'a, E: mockable::Env> {
    env: &'a E,
}

impl<'a, E: mockable::Env> SocketResolver<'a, E> {
    /// Creates a new socket resolver with the given environment provider.
    #[must_use]
    pub const fn new(env: &'a E) -> Self {
        Self { env }
    }

    /// Resolves the socket endpoint from `DOCKER_HOST`, `CONTAINER_HOST`,
    /// then `PODMAN_HOST`.
    ///
    /// Empty values are skipped. Returns `None` when nothing is set.
    #[must_use]
    pub fn resolve_from_env(&self) -> Option<String> {
        FALLBACK_ENV_VARS
            .iter()
            .filter_map(|var_name| self.env.string(var_name))
            .find(|value| !value.is_empty())
    }

    /// Returns the platform default socket path.
    #[must_use]
    pub const fn default_socket() -> &'static str {
        DEFAULT_SOCKET
    }
}

enum SocketType {
    /// Unix socket or Windows named pipe with explicit scheme.
    Socket,
    /// HTTP, HTTPS, or TCP endpoint (TCP is rewritten to HTTP).
    Http,
    /// Bare path without scheme prefix.
    BarePath,
}

impl SocketType {
    fn classify(socket: &str) -> Self {
        if socket.starts_with("unix://") || socket.starts_with("npipe://") {
            Self::Socket
        } else if ["tcp://", "http://", "https://"]
            .iter()
            .any(|scheme| socket.starts_with(scheme))
        {
            Self::Http
        } else {
            Self::BarePath
        }
    }
}

/// Connects to Docker or Podman and runs commands in their containers.
pub struct EngineConnector;

impl EngineConnector {
    /// Connect to the container engine at the specified socket.
    ///
    /// Accepts `unix://`, `npipe://`, `tcp://` (treated as HTTP), `http://`
    /// and `https://` endpoints. Bare paths starting with `\\` or `//` are
    /// treated as named pipes; any other bare path is a Unix socket.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::ConnectionFailed` if the connection cannot be
    /// established.
    pub fn connect(socket: &str) -> Result<Docker, WfverifyError> {
        let docker = match SocketType::classify(socket) {
            SocketType::Socket => Docker::connect_with_socket(
                socket,
                CONNECTION_TIMEOUT_SECS,
                bollard::API_DEFAULT_VERSION,
            ),
            SocketType::Http => Docker::connect_with_http(
                &socket.replacen("tcp://", "http://", 1),
                CONNECTION_TIMEOUT_SECS,
                bollard::API_DEFAULT_VERSION,
            ),
            SocketType::BarePath => Docker::connect_with_socket(
                &Self::normalize_bare_path(socket),
                CONNECTION_TIMEOUT_SECS,
                bollard::API_DEFAULT_VERSION,
            ),
        }
        .map_err(|e| {
            WfverifyError::from(ContainerError::ConnectionFailed {
                message: e.to_string(),
            })
        })?;

        Ok(docker)
    }

    fn normalize_bare_path(path: &str) -> String {
        if path.starts_with("\\\\") || path.starts_with("//") {
            format!("npipe://{path}")
        } else {
            format!("unix://{path}")
        }
    }

    /// Resolves the socket endpoint without establishing a connection.
    ///
    /// Resolution order:
    /// 1. `config_socket` (from CLI, config file, or `WFVERIFY_ENGINE_SOCKET`)
    /// 2. `DOCKER_HOST`, `CONTAINER_HOST`, `PODMAN_HOST` (via resolver)
    /// 3. Platform default socket
    #[must_use]
    pub fn resolve_socket<E: mockable::Env>(
        config_socket: Option<&str>,
        resolver: &SocketResolver<'_, E>,
    ) -> String {
        config_socket
            .filter(|s| !s.is_empty())
            .map(String::from)
            .or_else(|| resolver.resolve_from_env())
            .unwrap_or_else(|| SocketResolver::<E>::default_socket().to_owned())
    }

    /// Connect using the resolved socket, then confirm the engine answers a
    /// ping.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::ConnectionFailed` if the connection fails,
    /// `ContainerError::HealthCheckFailed` if the ping is rejected and
    /// `ContainerError::HealthCheckTimeout` if it does not return in time.
    pub async fn connect_with_fallback_and_verify_async<E: mockable::Env>(
        config_socket: Option<&str>,
        resolver: &SocketResolver<'_, E>,
    ) -> Result<Docker, WfverifyError> {
        let socket = Self::resolve_socket(config_socket, resolver);
        tracing::debug!(%socket, "connecting to container engine");
        let docker = Self::connect(&socket)?;
        Self::health_check_async(&docker).await?;
        Ok(docker)
    }

    /// Verify the container engine is responsive.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::HealthCheckFailed` if the engine does not
    /// respond correctly, or `ContainerError::HealthCheckTimeout` if the
    /// check times out.
    pub async fn health_check_async(docker: &Docker) -> Result<(), WfverifyError> {
        let timeout = Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS);

        tokio::time::timeout(timeout, docker.ping())
            .await
            .map_err(|_| {
                WfverifyError::from(ContainerError::HealthCheckTimeout {
                    seconds: HEALTH_CHECK_TIMEOUT_SECS,
                })
            })?
            .map_err(|e| {
                WfverifyError::from(ContainerError::HealthCheckFailed {
                    message: e.to_string(),
                })
            })?;
        Ok(())
    }

    /// Create the tokio runtime that drives the blocking entry points.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::RuntimeCreationFailed` if the runtime cannot
    /// be built.
    pub fn create_runtime() -> Result<tokio::runtime::Runtime, WfverifyError> {
        tokio::runtime::Runtime::new().map_err(|e| {
            WfverifyError::from(ContainerError::RuntimeCreationFailed {
                message: e.to_string(),
            })
        })
    }
}
