use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ApiResponse;
use crate::metrics::METRICS;
use crate::model::Coupon;

use super::CouponLookup;

/// HTTP implementation of [`CouponLookup`] against the coupon service.
pub struct HttpCouponLookup {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCouponLookup {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, code: &str) -> String {
        format!("{}/api/coupon/code/{code}", self.base_url)
    }
}

#[async_trait]
impl CouponLookup for HttpCouponLookup {
    async fn fetch(&self, code: &str) -> Option<Coupon> {
        if code.is_empty() {
            warn!("coupon lookup requested with empty code");
            return None;
        }

        let url = self.endpoint(code);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%url, error = %err, "coupon service unreachable");
                METRICS.record_collaborator_failure("coupon", "transport");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, coupon_code = code, "coupon service returned non-success status");
            METRICS.record_collaborator_failure("coupon", "status");
            return None;
        }

        let envelope: ApiResponse<serde_json::Value> = match response.json().await {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(%url, error = %err, "failed to decode coupon response envelope");
                METRICS.record_collaborator_failure("coupon", "decode");
                return None;
            }
        };

        if !envelope.is_success {
            warn!(coupon_code = code, message = %envelope.message, "coupon not found or invalid");
            return None;
        }

        let result = envelope.result?;
        match serde_json::from_value::<Coupon>(result) {
            Ok(coupon) => {
                debug!(coupon_code = code, "fetched coupon");
                Some(coupon)
            }
            Err(err) => {
                warn!(coupon_code = code, error = %err, "coupon payload did not match expected shape");
                METRICS.record_collaborator_failure("coupon", "decode");
                None
            }
        }
    }
}
