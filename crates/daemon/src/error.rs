// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Fatal-to-the-worker failures: a worker that returns one of these stops
/// its ping loop and is reported to the pool's error channel.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to connect to coordinator after exhausted retries: {0}")]
    Connect(#[source] ja_wire::CoordinatorError),
}

/// Configuration assembly failures (missing required field, bad TOML, etc).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing required setting: {0}")]
    Missing(&'static str),
}
