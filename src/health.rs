use crate::state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

/// Health status for a component or the overall system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Component is functioning normally
    Healthy,
    /// Component is functioning but degraded
    Degraded,
    /// Component is not functioning
    Unhealthy,
}

impl HealthStatus {
    /// Returns the HTTP status code for this health status
    pub fn status_code(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy => StatusCode::OK,
            // Still serve traffic but indicate degradation
            HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Combines two health statuses, returning the worse of the two
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
            _ => HealthStatus::Healthy,
        }
    }
}

/// Health check result for a component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub component: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ComponentHealth {
    pub fn healthy(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            error: None,
            timestamp: Self::now(),
            details: None,
        }
    }

    pub fn healthy_with_details(component: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            error: None,
            timestamp: Self::now(),
            details: Some(details),
        }
    }

    pub fn unhealthy(component: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            error: Some(error.into()),
            timestamp: Self::now(),
            details: None,
        }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

/// Overall health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: i64,
    pub version: String,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        let status = self.status.status_code();
        (status, Json(self)).into_response()
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub status: HealthStatus,
    pub timestamp: i64,
    pub components: Vec<ComponentHealth>,
}

impl IntoResponse for ReadinessResponse {
    fn into_response(self) -> Response {
        let status = if self.ready {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (status, Json(self)).into_response()
    }
}

/// Liveness probe: the process is up and serving.
pub async fn liveness_handler() -> HealthResponse {
    HealthResponse {
        status: HealthStatus::Healthy,
        timestamp: ComponentHealth::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Readiness probe: configuration and storage are usable.
///
/// Remote collaborators are deliberately not probed here: their failures
/// degrade cart reads gracefully, so they never gate readiness.
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> ReadinessResponse {
    let mut components = Vec::new();

    let store_health = match state.store_stats() {
        Ok(stats) => ComponentHealth::healthy_with_details(
            "store",
            serde_json::json!({ "headers": stats.headers, "lines": stats.lines }),
        ),
        Err(err) => ComponentHealth::unhealthy("store", err.to_string()),
    };
    components.push(store_health);

    let config = state.config();
    components.push(ComponentHealth::healthy_with_details(
        "collaborators",
        serde_json::json!({
            "product_base_url": config.product_base_url,
            "coupon_base_url": config.coupon_base_url,
        }),
    ));

    let status = components
        .iter()
        .fold(HealthStatus::Healthy, |acc, c| acc.combine(c.status));

    ReadinessResponse {
        ready: status != HealthStatus::Unhealthy,
        status,
        timestamp: ComponentHealth::now(),
        components,
    }
}
