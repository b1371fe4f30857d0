#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use cart_api::clients::{CouponLookup, ProductCatalog};
use cart_api::config::ServerConfig;
use cart_api::model::{Coupon, DiscountKind, Product};
use cart_api::service::CartService;
use cart_api::store::MemoryStore;

/// Product catalog stub returning a fixed product list.
pub struct StubCatalog {
    pub products: Vec<Product>,
}

#[async_trait]
impl ProductCatalog for StubCatalog {
    async fn fetch_all(&self) -> Vec<Product> {
        self.products.clone()
    }
}

/// Coupon lookup stub returning coupons by code.
pub struct StubCoupons {
    pub coupons: HashMap<String, Coupon>,
}

impl StubCoupons {
    pub fn empty() -> Self {
        Self {
            coupons: HashMap::new(),
        }
    }

    pub fn with(coupon: Coupon) -> Self {
        let mut coupons = HashMap::new();
        coupons.insert(coupon.coupon_code.clone(), coupon);
        Self { coupons }
    }
}

#[async_trait]
impl CouponLookup for StubCoupons {
    async fn fetch(&self, code: &str) -> Option<Coupon> {
        self.coupons.get(code).cloned()
    }
}

pub fn product(product_id: u64, price: f64) -> Product {
    Product {
        product_id,
        name: format!("product-{product_id}"),
        price,
        description: format!("description for {product_id}"),
        category_name: "general".to_string(),
        image_url: String::new(),
    }
}

pub fn coupon(code: &str, kind: DiscountKind, amount: f64, min_amount: f64) -> Coupon {
    Coupon {
        coupon_id: 1,
        coupon_code: code.to_string(),
        discount_amount: amount,
        min_amount,
        amount_type: kind,
        limit_use: 1,
        date_init: None,
        date_end: None,
        category: "GENERAL".to_string(),
        state_coupon: true,
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_bind_address: "127.0.0.1:0".parse().unwrap(),
        product_base_url: "http://products.test".to_string(),
        coupon_base_url: "http://coupons.test".to_string(),
        backend_bearer_token: None,
        request_timeout_secs: 5,
        graceful_shutdown_timeout_secs: 5,
    }
}

/// (header count, line count) currently stored.
pub fn row_counts(store: &MemoryStore) -> (usize, usize) {
    use cart_api::store::CartStore;
    let stats = store.stats().unwrap();
    (stats.headers, stats.lines)
}

/// Cart service over a fresh in-memory store and the given stubs.
pub fn service_with(
    products: Vec<Product>,
    coupons: StubCoupons,
) -> (CartService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let service = CartService::new(
        store.clone(),
        Arc::new(StubCatalog { products }),
        Arc::new(coupons),
    );
    (service, store)
}
