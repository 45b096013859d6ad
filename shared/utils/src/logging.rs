use anyhow::{Context, Result};
use std::sync::Mutex;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level. Fails if a global subscriber
/// is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_filter(&config.level);
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            let fmt_layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_thread_ids(true);

            if let Some(file_path) = &config.file_path {
                let file = open_log_file(file_path)?;
                registry.with(fmt_layer.with_writer(Mutex::new(file))).try_init()?;
            } else {
                registry.with(fmt_layer).try_init()?;
            }
        }
        _ => {
            let fmt_layer = fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_thread_ids(true);

            if let Some(file_path) = &config.file_path {
                let file = open_log_file(file_path)?;
                registry
                    .with(fmt_layer.with_ansi(false).with_writer(Mutex::new(file)))
                    .try_init()?;
            } else {
                registry.with(fmt_layer).try_init()?;
            }
        }
    }

    tracing::info!("Logging initialized with level: {}", config.level);
    Ok(())
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(level))
}

/// Filter for the configured level, `info` when it does not parse.
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn open_log_file(file_path: &str) -> Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)
        .with_context(|| format!("cannot open log file {}", file_path))
}

#[macro_export]
macro_rules! log_error {
    ($err:expr, $msg:expr) => {
        tracing::error!(error = %$err, $msg);
    };
    ($err:expr, $msg:expr, $($field:tt)*) => {
        tracing::error!(error = %$err, $($field)*, $msg);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back() {
        assert_eq!(level_filter("===").to_string(), "info");
        assert_eq!(level_filter("debug").to_string(), "debug");
    }

    #[test]
    fn test_unwritable_log_file_is_an_error() {
        let err = open_log_file("/nonexistent-dir/labqc/app.log").unwrap_err();
        assert!(err.to_string().contains("cannot open log file"));
    }
}
