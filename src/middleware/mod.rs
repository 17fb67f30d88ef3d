//! HTTP middleware components.
//!
//! Middleware wraps every route and can short-circuit requests before they
//! reach a handler.

/// Cross-origin access and pre-flight handling
pub mod cors;
