//! Database connection pool for the direct PostgreSQL store.
//!
//! The validator only reads from the `card_keys` table, which is owned and
//! migrated by the system that issues keys.

use sqlx::{Pool, Postgres};

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// # Configuration
///
/// - Maximum connections: 5
/// - Connections are opened lazily on first use, so an unreachable database
///   at startup turns into per-request lookup failures instead of a crash
///
/// # Errors
///
/// Returns an error if the connection string cannot be parsed.
pub fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect_lazy(database_url)
}
