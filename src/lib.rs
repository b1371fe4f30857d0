pub mod clients;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod pricing;
pub mod service;
pub mod shutdown;
pub mod state;
pub mod store;

pub use config::{CliArgs, ServerConfig};
pub use error::{ApiResponse, CartError};
pub use logging::{LoggingConfig, init_logging};
pub use service::CartService;
pub use shutdown::{ShutdownConfig, ShutdownCoordinator};

use anyhow::Result;
use shutdown::{AppStateShutdownHandler, CompositeShutdownHandler};
use state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let config = Arc::new(config);
    let state = Arc::new(AppState::new(config.clone())?);

    tracing::info!(
        bind = %config.http_bind_address,
        product_service = %config.product_base_url,
        coupon_service = %config.coupon_base_url,
        "starting cart API server",
    );

    let coordinator = Arc::new(ShutdownCoordinator::new(
        ShutdownConfig::default().with_total_timeout(config.graceful_shutdown_timeout_secs),
    ));

    let mut composite_handler = CompositeShutdownHandler::new();
    composite_handler.add_handler(Box::new(AppStateShutdownHandler::new(state.clone())));

    let router = http::router(state);

    let listener = TcpListener::bind(config.http_bind_address).await?;
    let actual_addr = listener.local_addr()?;
    tracing::info!(bind = %actual_addr, "listening");

    let shutdown_coordinator = coordinator.clone();
    let server_result = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_coordinator.wait_for_signal().await;
        })
        .await;

    tracing::info!("server stopped, running shutdown handlers");
    composite_handler
        .shutdown(coordinator.total_timeout())
        .await?;

    server_result.map_err(anyhow::Error::from)
}
