//! Prometheus metrics for production observability.
//!
//! Exposed as text on `GET /metrics`.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;
use std::sync::Arc;

/// Global metrics registry instance
pub static METRICS: Lazy<Arc<MetricsCollector>> = Lazy::new(|| Arc::new(MetricsCollector::new()));

/// Labels for cart operation metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OperationLabels {
    /// Operation name (e.g., "get_cart", "upsert_line")
    pub operation: String,
    /// Outcome ("success", "not_found", "validation", "storage")
    pub outcome: String,
}

/// Labels for remote collaborator failure metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CollaboratorLabels {
    /// Collaborator name ("product" or "coupon")
    pub collaborator: String,
    /// Failure mode ("transport", "status", "decode", "envelope")
    pub reason: String,
}

/// Central metrics collector with Prometheus registry
pub struct MetricsCollector {
    registry: RwLock<Registry>,

    /// Total cart operations by name and outcome
    pub cart_operations_total: Family<OperationLabels, Counter>,

    /// Remote collaborator calls downgraded to empty results
    pub collaborator_failures_total: Family<CollaboratorLabels, Counter>,
}

impl MetricsCollector {
    /// Create a new metrics collector with all metrics registered
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let cart_operations_total = Family::<OperationLabels, Counter>::default();
        registry.register(
            "cart_operations_total",
            "Total number of cart operations",
            cart_operations_total.clone(),
        );

        let collaborator_failures_total = Family::<CollaboratorLabels, Counter>::default();
        registry.register(
            "cart_collaborator_failures_total",
            "Remote collaborator failures downgraded to empty results",
            collaborator_failures_total.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            cart_operations_total,
            collaborator_failures_total,
        }
    }

    /// Record one cart operation outcome
    pub fn record_operation(&self, operation: &str, outcome: &str) {
        self.cart_operations_total
            .get_or_create(&OperationLabels {
                operation: operation.to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
    }

    /// Record one degraded collaborator call
    pub fn record_collaborator_failure(&self, collaborator: &str, reason: &str) {
        self.collaborator_failures_total
            .get_or_create(&CollaboratorLabels {
                collaborator: collaborator.to_string(),
                reason: reason.to_string(),
            })
            .inc();
    }

    /// Encode all metrics in Prometheus text format
    pub fn encode(&self) -> String {
        let registry = self.registry.read();
        let mut output = String::new();
        if let Err(err) = encode(&mut output, &registry) {
            tracing::error!("failed to encode metrics: {}", err);
        }
        output
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_operations_appear_in_encoded_output() {
        let collector = MetricsCollector::new();
        collector.record_operation("get_cart", "success");
        collector.record_collaborator_failure("product", "transport");

        let output = collector.encode();
        assert!(output.contains("cart_operations_total"));
        assert!(output.contains("operation=\"get_cart\""));
        assert!(output.contains("collaborator=\"product\""));
    }
}
