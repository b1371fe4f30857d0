//! Remote collaborator seams: product catalog and coupon lookup.
//!
//! Both collaborators degrade gracefully. A transport error, non-success
//! status, failed envelope, or undecodable payload yields an empty result
//! (logged and counted), never a hard error, so cart reads still succeed
//! without enrichment or discount.

mod coupon;
mod product;

pub use coupon::HttpCouponLookup;
pub use product::HttpProductCatalog;

use async_trait::async_trait;

use crate::model::{Coupon, Product};

/// Fetch-all contract of the remote product service. No pagination, no
/// filtering; the response is treated as authoritative current pricing.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn fetch_all(&self) -> Vec<Product>;
}

/// Lookup contract of the remote coupon service. Empty or unknown codes
/// yield `None`, not an error.
#[async_trait]
pub trait CouponLookup: Send + Sync {
    async fn fetch(&self, code: &str) -> Option<Coupon>;
}

/// Shared reqwest client setup: JSON, per-request timeout, and an optional
/// bearer token forwarded to the backing services.
pub(crate) fn build_http_client(
    timeout_secs: u64,
    bearer_token: Option<&str>,
) -> anyhow::Result<reqwest::Client> {
    use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

    let mut headers = HeaderMap::new();
    if let Some(token) = bearer_token {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|err| anyhow::anyhow!("invalid backend bearer token: {err}"))?;
        headers.insert(AUTHORIZATION, value);
    }

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .default_headers(headers)
        .build()
        .map_err(anyhow::Error::from)
}
