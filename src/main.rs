use std::sync::Arc;

use api_rest::AppState;
use hms_core::CoreConfig;
use hms_core::config::{
    admin_password_from_env_value, admin_username_from_env_value, data_dir_from_env_value,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the hospital management service
///
/// Opens (or creates) the store, seeds the fixed departments and the administrator account, then
/// serves the REST API until the server fails or the process receives Ctrl-C.
///
/// # Environment Variables
/// - `HMS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `HMS_DATA_DIR`: Directory for the store snapshot (default: "hospital_data")
/// - `HMS_ADMIN_USERNAME`: Seeded administrator username (default: "admin")
/// - `HMS_ADMIN_PASSWORD`: Seeded administrator password (default: "admin123")
///
/// # Returns
/// * `Ok(())` - If the server runs and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, seeding or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hms_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("hms_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("HMS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = CoreConfig::new(
        data_dir_from_env_value(std::env::var("HMS_DATA_DIR").ok()),
        &admin_username_from_env_value(std::env::var("HMS_ADMIN_USERNAME").ok()),
        admin_password_from_env_value(std::env::var("HMS_ADMIN_PASSWORD").ok()),
    )?;
    tracing::info!("++ Using data directory {}", cfg.data_dir().display());

    let store = hms_core::bootstrap(&cfg)?;
    let state = AppState::new(Arc::new(store));

    tracing::info!("++ Starting HMS REST on {}", rest_addr);
    tokio::select! {
        result = api_rest::serve(&rest_addr, state) => result,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("-- Shutting down");
            Ok(())
        }
    }
}
