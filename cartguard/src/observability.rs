//! Logging, error reporting and metrics setup for the binary.

use crate::config::{LogFormat, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(thiserror::Error, Debug)]
pub enum ObservabilityError {
    #[error("could not install log subscriber: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
    #[error("could not set up statsd exporter: {0}")]
    Metrics(String),
}

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default `info` level.
///
/// The returned guard flushes Sentry on drop and must be held for the process lifetime.
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<Option<sentry::ClientInitGuard>, ObservabilityError> {
    let sentry_guard = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = match config.format {
        LogFormat::Pretty => fmt::layer().with_target(false).boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
    };
    let sentry_layer = sentry_guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .with(sentry_layer)
        .try_init()?;

    Ok(sentry_guard)
}

/// Routes the `metrics` facade to statsd and registers metric descriptions.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), ObservabilityError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(&config.prefix))
        .map_err(|e| ObservabilityError::Metrics(e.to_string()))?;
    metrics::set_global_recorder(recorder)
        .map_err(|e| ObservabilityError::Metrics(e.to_string()))?;

    shared::metrics_defs::describe_all(cart_extension::metrics_defs::ALL_METRICS);
    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Metrics exported to statsd"
    );
    Ok(())
}
