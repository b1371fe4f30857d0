use crate::clients::{
    CouponLookup, HttpCouponLookup, HttpProductCatalog, ProductCatalog, build_http_client,
};
use crate::config::ServerConfig;
use crate::service::CartService;
use crate::store::{CartStore, MemoryStore, StoreStats};
use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Application state shared across request handlers.
pub struct AppState {
    config: Arc<ServerConfig>,
    store: Arc<dyn CartStore>,
    service: CartService,
    started_at: Instant,
    /// Request counter for monitoring
    requests: AtomicU64,
}

impl AppState {
    /// Wire the state for production: in-process store plus HTTP
    /// collaborators built from the configured base URLs.
    pub fn new(config: Arc<ServerConfig>) -> Result<Self> {
        let client = build_http_client(
            config.request_timeout_secs,
            config.backend_bearer_token.as_deref(),
        )?;

        let store: Arc<dyn CartStore> = Arc::new(MemoryStore::new());
        let products: Arc<dyn ProductCatalog> = Arc::new(HttpProductCatalog::new(
            client.clone(),
            config.product_base_url.clone(),
        ));
        let coupons: Arc<dyn CouponLookup> = Arc::new(HttpCouponLookup::new(
            client,
            config.coupon_base_url.clone(),
        ));

        Ok(Self::with_collaborators(config, store, products, coupons))
    }

    /// Wire the state with explicit collaborators. Test seam.
    pub fn with_collaborators(
        config: Arc<ServerConfig>,
        store: Arc<dyn CartStore>,
        products: Arc<dyn ProductCatalog>,
        coupons: Arc<dyn CouponLookup>,
    ) -> Self {
        let service = CartService::new(store.clone(), products, coupons);
        Self {
            config,
            store,
            service,
            started_at: Instant::now(),
            requests: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> Arc<ServerConfig> {
        self.config.clone()
    }

    pub fn service(&self) -> &CartService {
        &self.service
    }

    pub fn store_stats(&self) -> crate::store::StoreResult<StoreStats> {
        self.store.stats()
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
