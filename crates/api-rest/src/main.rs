//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own. The workspace's main `hms-run` binary does the same and
//! is what deployments use; this one is handy when iterating on the HTTP crate alone.

use api_rest::AppState;
use hms_core::config::{
    admin_password_from_env_value, admin_username_from_env_value, data_dir_from_env_value,
};
use hms_core::CoreConfig;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the HMS REST API server
///
/// # Environment Variables
/// - `HMS_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `HMS_DATA_DIR`: Directory holding the store snapshot (default: "hospital_data")
/// - `HMS_ADMIN_USERNAME` / `HMS_ADMIN_PASSWORD`: seeded administrator
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the store cannot be opened or seeded,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("hms_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("HMS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = CoreConfig::new(
        data_dir_from_env_value(std::env::var("HMS_DATA_DIR").ok()),
        &admin_username_from_env_value(std::env::var("HMS_ADMIN_USERNAME").ok()),
        admin_password_from_env_value(std::env::var("HMS_ADMIN_PASSWORD").ok()),
    )?;

    tracing::info!("-- Starting HMS REST API on {}", addr);
    let store = hms_core::bootstrap(&cfg)?;
    api_rest::serve(&addr, AppState::new(Arc::new(store))).await
}
