//! Container engine access for the scheduler controller.
//!
//! Scheduler commands run inside the controller container through the
//! engine's exec API. The socket endpoint is resolved through a
//! priority-based fallback chain:
//!
//! 1. CLI argument (`--engine-socket`)
//! 2. Config file (`engine_socket` in TOML)
//! 3. `WFVERIFY_ENGINE_SOCKET` environment variable
//! 4. `DOCKER_HOST` environment variable
//! 5. `CONTAINER_HOST` environment variable
//! 6. `PODMAN_HOST` environment variable
//! 7. Platform default (`/var/run/docker.sock` on Unix)

mod connection;

pub use connection::{
    ContainerExecClient, CreateExecFuture, EngineConnector, ExecOutput, ExecRequest,
    InspectExecFuture, SocketResolver, StartExecFuture,
};
