//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (query string, shared state)
//! 2. Delegates to the validation service or the store
//! 3. Returns HTTP response (JSON, status code)

/// Service health endpoint
pub mod health;
/// Card key validation endpoint
pub mod validate;
