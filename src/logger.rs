//! Tracing setup. Diagnostics go to stderr so stdout stays clean for the
//! NDJSON checkpoint stream; with a log directory configured, a daily
//! rolling file gets the same events without ANSI noise.

use std::path::PathBuf;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Install the global subscriber. `log_level` is an `EnvFilter` directive
/// (e.g. `"info"` or `"sketch2canvas=debug"`). Keep the returned guard
/// alive for the process lifetime or buffered file output is lost.
pub fn init_tracing(log_level: &str, log_dir: Option<PathBuf>) -> Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(log_level));

    match log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "sketch2canvas.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(log_level));
            Registry::default().with(stderr_layer).with(file_layer).init();
            Ok(Some(guard))
        }
        None => {
            Registry::default().with(stderr_layer).init();
            Ok(None)
        }
    }
}
