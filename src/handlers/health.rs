//! Health check endpoint for service monitoring.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,

    /// Whether the store answered a clock query
    pub store: String,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// # Checks
///
/// - Store reachability (asks the store for its clock)
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "healthy",
///   "store": "reachable",
///   "timestamp": "2025-12-21T19:00:00Z"
/// }
/// ```
///
/// An unreachable store is reported in the body, not as an error status,
/// since validation keeps working in degraded form without the store clock.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = match state.store.server_time().await {
        Ok(_) => "reachable",
        Err(e) => {
            tracing::warn!(error = %e, "store health probe failed");
            "unreachable"
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        store: store.to_string(),
        timestamp: Utc::now(),
    })
}
