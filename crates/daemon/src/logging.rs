// SPDX-License-Identifier: MIT

//! Installs the `tracing` subscriber: an `EnvFilter` driven by `RUST_LOG`,
//! writing to stderr and, when configured, a rolling file via
//! `tracing-appender`'s non-blocking writer.

use crate::config::WorkerConfig;
use std::io;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Holds the non-blocking file writer's background flush thread alive for
/// the process lifetime. Drop it only at shutdown.
pub struct LogGuard(#[allow(dead_code)] Option<tracing_appender::non_blocking::WorkerGuard>);

pub fn init(config: &WorkerConfig) -> io::Result<LogGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path.file_name().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "log file path has no file name")
            })?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_writer(non_blocking))
                .with(fmt::layer().with_writer(io::stderr))
                .init();
            Ok(LogGuard(Some(guard)))
        }
        None => {
            registry.with(fmt::layer().with_writer(io::stderr)).init();
            Ok(LogGuard(None))
        }
    }
}
