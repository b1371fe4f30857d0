use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ApiResponse;
use crate::metrics::METRICS;
use crate::model::Product;

use super::ProductCatalog;

/// HTTP implementation of [`ProductCatalog`] against the product service.
pub struct HttpProductCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProductCatalog {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/product", self.base_url)
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn fetch_all(&self) -> Vec<Product> {
        let url = self.endpoint();

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%url, error = %err, "product service unreachable");
                METRICS.record_collaborator_failure("product", "transport");
                return Vec::new();
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "product service returned non-success status");
            METRICS.record_collaborator_failure("product", "status");
            return Vec::new();
        }

        let envelope: ApiResponse<serde_json::Value> = match response.json().await {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(%url, error = %err, "failed to decode product response envelope");
                METRICS.record_collaborator_failure("product", "decode");
                return Vec::new();
            }
        };

        if !envelope.is_success {
            warn!(%url, message = %envelope.message, "product service reported failure");
            METRICS.record_collaborator_failure("product", "envelope");
            return Vec::new();
        }

        let Some(result) = envelope.result else {
            warn!(%url, "product response carried no payload");
            METRICS.record_collaborator_failure("product", "envelope");
            return Vec::new();
        };

        match serde_json::from_value::<Vec<Product>>(result) {
            Ok(products) => {
                debug!(count = products.len(), "fetched product catalog");
                products
            }
            Err(err) => {
                warn!(%url, error = %err, "product payload did not match expected shape");
                METRICS.record_collaborator_failure("product", "decode");
                Vec::new()
            }
        }
    }
}
