//! Router assembly and shared application state.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{error, handlers, middleware, store::CardKeyStore};

/// State shared with every handler.
///
/// Holds only the injected store; nothing here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CardKeyStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn CardKeyStore>) -> Self {
        Self { store }
    }
}

/// Build the HTTP router.
///
/// Layers, outermost first: request tracing, CORS (answers pre-flight
/// requests and tags every response, including panic responses), then panic
/// recovery.
///
/// `/api/validate` serves GET only. HEAD gets its own 405 handler because
/// axum otherwise routes it to the GET handler.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/validate",
            get(handlers::validate::validate_card_key)
                .head(handlers::validate::method_not_allowed)
                .fallback(handlers::validate::method_not_allowed),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::cors::cors_layer())
                .layer(CatchPanicLayer::custom(error::panic_response)),
        )
        .with_state(state)
}
