//! Graceful shutdown coordination.
//!
//! Handles SIGTERM and SIGINT, lets axum drain in-flight requests, then
//! runs the registered shutdown handlers under a total timeout.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::state::AppState;

/// Configuration for graceful shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Total maximum time allotted to the shutdown handlers
    pub total_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            total_timeout: Duration::from_secs(20),
        }
    }
}

impl ShutdownConfig {
    /// Create a shutdown config with custom total timeout
    pub fn with_total_timeout(mut self, timeout_secs: u64) -> Self {
        self.total_timeout = Duration::from_secs(timeout_secs);
        self
    }
}

/// Coordinates shutdown signal handling for the server.
pub struct ShutdownCoordinator {
    config: ShutdownConfig,
}

impl ShutdownCoordinator {
    pub fn new(config: ShutdownConfig) -> Self {
        Self { config }
    }

    pub fn total_timeout(&self) -> Duration {
        self.config.total_timeout
    }

    /// Wait until SIGINT or SIGTERM is received.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("failed to install SIGINT handler: {}", err);
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(err) => error!("failed to install SIGTERM handler: {}", err),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => info!("received SIGINT, shutting down"),
            () = terminate => info!("received SIGTERM, shutting down"),
        }
    }
}

/// One component's cleanup work during shutdown.
#[async_trait]
pub trait ShutdownHandler: Send + Sync {
    fn name(&self) -> &'static str;
    async fn shutdown(&self) -> Result<()>;
}

/// Runs all registered handlers sequentially under the total timeout.
pub struct CompositeShutdownHandler {
    handlers: Vec<Box<dyn ShutdownHandler>>,
}

impl CompositeShutdownHandler {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn ShutdownHandler>) {
        self.handlers.push(handler);
    }

    pub async fn shutdown(&self, total_timeout: Duration) -> Result<()> {
        let run_all = async {
            for handler in &self.handlers {
                info!(handler = handler.name(), "running shutdown handler");
                if let Err(err) = handler.shutdown().await {
                    error!(handler = handler.name(), "shutdown handler failed: {}", err);
                }
            }
        };

        if timeout(total_timeout, run_all).await.is_err() {
            warn!(
                timeout_secs = total_timeout.as_secs(),
                "shutdown handlers exceeded total timeout"
            );
        }
        Ok(())
    }
}

impl Default for CompositeShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs final request and storage counts before the process exits.
pub struct AppStateShutdownHandler {
    state: Arc<AppState>,
}

impl AppStateShutdownHandler {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ShutdownHandler for AppStateShutdownHandler {
    fn name(&self) -> &'static str {
        "app_state"
    }

    async fn shutdown(&self) -> Result<()> {
        let requests = self.state.request_count();
        let uptime = self.state.uptime_secs();
        match self.state.store_stats() {
            Ok(stats) => info!(
                requests,
                uptime_secs = uptime,
                headers = stats.headers,
                lines = stats.lines,
                "final state before shutdown"
            ),
            Err(err) => warn!("could not read store stats during shutdown: {}", err),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FlagHandler {
        flag: Arc<AtomicBool>,
    }

    #[async_trait]
    impl ShutdownHandler for FlagHandler {
        fn name(&self) -> &'static str {
            "flag"
        }

        async fn shutdown(&self) -> Result<()> {
            self.flag.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn composite_runs_all_handlers() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut composite = CompositeShutdownHandler::new();
        composite.add_handler(Box::new(FlagHandler { flag: flag.clone() }));

        composite.shutdown(Duration::from_secs(1)).await.unwrap();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn composite_survives_slow_handlers() {
        struct SlowHandler;

        #[async_trait]
        impl ShutdownHandler for SlowHandler {
            fn name(&self) -> &'static str {
                "slow"
            }

            async fn shutdown(&self) -> Result<()> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        }

        let mut composite = CompositeShutdownHandler::new();
        composite.add_handler(Box::new(SlowHandler));

        // Must return despite the handler overrunning.
        composite
            .shutdown(Duration::from_millis(50))
            .await
            .unwrap();
    }
}
