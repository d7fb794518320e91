pub mod cart;
pub mod config;
pub mod errors;
pub mod handler;
pub mod metrics_defs;
pub mod retry;
pub mod service;
pub mod telemetry;

#[cfg(test)]
mod testutils;

use config::ServiceConfig;
use errors::CartExtensionError;
use handler::CartHandler;
use service::CartExtensionService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use telemetry::{Forwarder, HttpSender};

/// Serves the extension endpoint and the admin endpoints until either listener fails.
pub async fn run(config: ServiceConfig) -> Result<(), CartExtensionError> {
    let sender = HttpSender::new(&config.telemetry)?;
    tracing::info!(
        endpoint = %sender.url(),
        max_attempts = config.telemetry.retry.max_attempts(),
        retry_interval_ms = config.telemetry.retry.delay().as_millis() as u64,
        "Telemetry forwarding configured"
    );

    let forwarder = Forwarder::new(Arc::new(sender), config.telemetry.retry);
    let extension_service = CartExtensionService::new(CartHandler::new(forwarder));
    // Telemetry settings are validated before we get here
    let admin_service = AdminService::<_, CartExtensionError>::new(|| true);

    tokio::try_join!(
        run_http_service(
            &config.listener.host,
            config.listener.port,
            extension_service
        ),
        run_http_service(
            &config.admin_listener.host,
            config.admin_listener.port,
            admin_service
        ),
    )?;

    Ok(())
}
