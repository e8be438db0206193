//! Observability.
//!
//! Installs the global `tracing` subscriber. Console output goes to stderr so
//! it never mixes with note output on stdout. Metrics are recorded through the
//! `metrics` facade; no exporter is installed here, so they are dropped unless
//! an embedder installs a recorder.

mod logging;

pub use logging::{LOG_ENV, LogSettings, resolve_directive};

use crate::config::LogFormat;
use crate::{Error, Result};
use std::sync::OnceLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static LOGGING_INIT: OnceLock<()> = OnceLock::new();

/// Initializes logging for the process.
///
/// # Errors
///
/// Returns an error if logging has already been initialized or the log file
/// cannot be opened.
pub fn init(settings: LogSettings) -> Result<()> {
    if LOGGING_INIT.get().is_some() {
        return Err(init_error("logging already initialized"));
    }

    match (&settings.file, settings.format) {
        (Some(log_file), LogFormat::Json) => {
            let writer = logging::open_log_file(log_file)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .with(settings.filter)
                .try_init()
                .map_err(init_error)?;
        },
        (Some(log_file), LogFormat::Pretty) => {
            let writer = logging::open_log_file(log_file)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .with(settings.filter)
                .try_init()
                .map_err(init_error)?;
        },
        (None, LogFormat::Json) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true),
                )
                .with(settings.filter)
                .try_init()
                .map_err(init_error)?;
        },
        (None, LogFormat::Pretty) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr)
                        .with_target(false),
                )
                .with(settings.filter)
                .try_init()
                .map_err(init_error)?;
        },
    }

    LOGGING_INIT
        .set(())
        .map_err(|()| init_error("failed to mark logging initialized"))
}

#[allow(clippy::needless_pass_by_value)]
fn init_error(cause: impl ToString) -> Error {
    Error::Config {
        cause: format!("logging init: {}", cause.to_string()),
    }
}
