//! Tracing subscriber setup.
//!
//! All pipeline warnings (rejected lines, skipped files, unknown models)
//! travel through `tracing` as side-channel diagnostics; they never alter
//! control flow. Output target and format come from [`crate::config`]:
//! console, daily-rolling file, or both, in pretty or JSON form.

use crate::config::get_config;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

// Keeps the non-blocking file writer flushing for the process lifetime.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initialize the logging system based on configuration.
pub fn init_logging() {
    let config = get_config();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.output.as_str() {
        "file" => init_file_logging(env_filter, &config.logging.format),
        "both" => init_combined_logging(env_filter, &config.logging.format),
        _ => init_console_logging(env_filter, &config.logging.format),
    }
}

fn file_writer() -> tracing_appender::non_blocking::NonBlocking {
    let config = get_config();
    let _ = std::fs::create_dir_all(&config.paths.log_directory);
    let file_appender =
        tracing_appender::rolling::daily(&config.paths.log_directory, "claude-meter.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = FILE_GUARD.set(guard);
    non_blocking
}

fn init_console_logging(filter: EnvFilter, format: &str) {
    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        "json" => {
            subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .init();
        }
        _ => {
            subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_ansi(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

fn init_file_logging(filter: EnvFilter, format: &str) {
    let subscriber = tracing_subscriber::registry().with(filter);
    let writer = file_writer();

    match format {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_writer(writer).with_current_span(true))
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .init();
        }
    }
}

fn init_combined_logging(filter: EnvFilter, format: &str) {
    let subscriber = tracing_subscriber::registry().with(filter);
    let writer = file_writer();

    match format {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(fmt::layer().json().with_writer(writer))
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
        }
    }
}
