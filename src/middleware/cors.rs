//! Cross-origin access for browser callers.
//!
//! Any origin may call the validator. Pre-flight `OPTIONS` requests are
//! answered here with an empty 200 and never reach a handler or the store.

use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// Build the CORS layer: any origin, `GET` and `OPTIONS`.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
}
