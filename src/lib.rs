pub mod core;
pub mod domain;
pub mod infra;
pub mod state;

use crate::core::gesture::controller::ToggleController;
use crate::core::sync::service::LightSynchronizer;
use domain::models::AppError;
use infra::bridge::client::HttpLightClient;
use infra::logging::init_tracing;
use infra::storage::settings_store::{load_or_default_settings, settings_path};
use std::sync::Arc;
use std::time::Duration;

/// Boots the toggle: settings, bridge client, synchronizer and controller,
/// then the reveal animation and the delayed startup reconciliation.
pub async fn run() -> Result<ToggleController<HttpLightClient>, AppError> {
    init_tracing();

    let path = settings_path();
    let config = load_or_default_settings(&path)?;
    tracing::info!(
        path = %path.display(),
        lights = config.sync.light_ids.len(),
        "settings loaded"
    );

    let client = Arc::new(HttpLightClient::new(&config.bridge)?);
    let sync = Arc::new(LightSynchronizer::new(client, config.sync.clone()));
    let mut controller = ToggleController::new(&config, sync);
    let _reveal = controller.reveal();

    tokio::time::sleep(Duration::from_millis(config.sync.startup_delay_ms)).await;
    match controller.reconcile().await {
        Some(on) => tracing::info!(on, "toggle placed from bridge state"),
        None => tracing::info!("toggle left in its initial layout"),
    }
    Ok(controller)
}
