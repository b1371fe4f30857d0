//! Error taxonomy and the uniform response envelope.
//!
//! Every operation reports its outcome through [`ApiResponse`]: a success
//! flag, an optional message, and an optional payload. Handlers never abort
//! the caller; failures surface as `is_success = false` with a message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Failures a cart operation can report.
///
/// Collaborator failures never appear here: the remote clients downgrade
/// them to empty results before the service sees them.
#[derive(Debug, Error)]
pub enum CartError {
    /// Missing cart, line item, or other entity. Non-fatal.
    #[error("{0}")]
    NotFound(String),

    /// Rejected before any side effect took place.
    #[error("{0}")]
    Validation(String),

    /// Storage layer failure.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl CartError {
    pub fn not_found(message: impl Into<String>) -> Self {
        CartError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CartError::Validation(message.into())
    }

    /// Error category label used by metrics.
    pub fn category(&self) -> &'static str {
        match self {
            CartError::NotFound(_) => "not_found",
            CartError::Validation(_) => "validation",
            CartError::Store(_) => "storage",
        }
    }
}

/// Wire envelope shared by this service's own API and the remote
/// product/coupon services it consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(default = "default_success")]
    pub is_success: bool,
    #[serde(default)]
    pub message: String,
}

fn default_success() -> bool {
    true
}

impl<T> ApiResponse<T> {
    pub fn ok(result: T) -> Self {
        Self {
            result: Some(result),
            is_success: true,
            message: String::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result: None,
            is_success: false,
            message: message.into(),
        }
    }
}

impl<T> From<Result<T, CartError>> for ApiResponse<T> {
    fn from(result: Result<T, CartError>) -> Self {
        match result {
            Ok(value) => ApiResponse::ok(value),
            Err(err) => ApiResponse::failure(err.to_string()),
        }
    }
}
