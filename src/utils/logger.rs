use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

fn parse_level(level: &str) -> Result<LevelFilter, String> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        other => Err(format!(
            "Invalid logging.level '{}'. Valid values: trace, debug, info, warn, error",
            other
        )),
    }
}

/// Builds the subscriber described by `logging_config`, writing to `writer`.
fn build_subscriber<W>(
    logging_config: &LoggingConfig,
    writer: W,
) -> Result<Box<dyn Subscriber + Send + Sync>, String>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let level_filter = parse_level(&logging_config.level)?;
    let filter_layer = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .from_env_lossy();

    let subscriber: Box<dyn Subscriber + Send + Sync> =
        match logging_config.format.to_lowercase().as_str() {
            "json" => Box::new(
                tracing_subscriber::registry().with(filter_layer).with(
                    fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_current_span(true)
                        .with_target(true)
                        .with_writer(writer),
                ),
            ),
            // "console" and anything unrecognised
            _ => Box::new(
                tracing_subscriber::registry()
                    .with(filter_layer)
                    .with(fmt::layer().pretty().with_writer(writer)),
            ),
        };
    Ok(subscriber)
}

/// Installs the global tracing subscriber.
///
/// Events go to stderr, leaving stdout to command output. `RUST_LOG`
/// directives are honoured on top of the configured level. Fails
/// on an unknown level or when a subscriber is already installed.
pub fn init_logging(logging_config: &LoggingConfig) -> Result<(), String> {
    build_subscriber(logging_config, std::io::stderr)?
        .try_init()
        .map_err(|e| format!("Failed to initialise logging: {}", e))
}
