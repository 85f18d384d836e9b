//! Distance provider errors.

use crate::error::FatalError;
use crate::store::StoreError;

/// Errors from a walking-cost provider or one of its layers.
#[derive(Debug, thiserror::Error)]
pub enum DistanceError {
    /// HTTP request to a routing service failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Routing service answered with a non-Ok status
    #[error("routing service returned {code}: {message}")]
    Status { code: String, message: String },

    /// Routing response had the wrong shape
    #[error("malformed routing response: {0}")]
    Malformed(String),

    /// Routing response was not valid JSON
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Estimate store failed
    #[error("estimate store error: {0}")]
    Store(#[from] StoreError),

    /// An estimator invariant was violated
    #[error(transparent)]
    Fatal(#[from] FatalError),
}
