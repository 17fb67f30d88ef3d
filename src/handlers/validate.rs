//! Card key validation endpoint.
//!
//! - GET /api/validate?key=... - Report whether a card key is usable now
//! - OPTIONS /api/validate - Answered by the CORS layer, never reaches here

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;

use crate::{
    app::AppState, error::AppError, models::card_key::ValidationResult,
    services::validation_service,
};

/// Query string of `GET /api/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    pub key: Option<String>,
}

/// Validate a card key.
///
/// # Endpoint
///
/// `GET /api/validate?key=<card key>`
///
/// # Response
///
/// - **200**: Validation result, including `valid: false` for unknown keys
/// - **400**: `key` missing or empty
/// - **500**: Store lookup failed
///
/// ```json
/// {
///   "valid": false,
///   "status": "expired",
///   "message": "card key has expired",
///   "key": "KMU8CZW7DZB71TB9",
///   "note": null,
///   "activated_at": "2025-01-01T00:00:00Z",
///   "expires_at": "2025-01-31T00:00:00Z",
///   "current_server_time": "2025-06-01T12:00:00.000Z",
///   "total_days": 30,
///   "remaining_days": 0
/// }
/// ```
pub async fn validate_card_key(
    State(state): State<AppState>,
    query: Result<Query<ValidateQuery>, QueryRejection>,
) -> Result<Json<ValidationResult>, AppError> {
    let Query(query) = query.map_err(|e| {
        tracing::warn!(error = %e, "unreadable query string");
        AppError::MissingKey
    })?;

    let key = query
        .key
        .filter(|k| !k.is_empty())
        .ok_or(AppError::MissingKey)?;

    let result = validation_service::validate_key(state.store.as_ref(), &key).await?;

    Ok(Json(result))
}

/// Fallback for every method the route does not serve.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
