//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `STORE_URL` (optional): Base URL of the REST card key store
/// - `STORE_KEY` (optional): Access key sent to the REST card key store
/// - `DATABASE_URL` (optional): PostgreSQL connection string, selects the direct database store
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
///
/// None of the store settings are required to start. Without them every lookup
/// fails with a 500, which is how an unconfigured deployment shows up.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store_url: Option<String>,

    #[serde(default)]
    pub store_key: Option<String>,

    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable value cannot be parsed into
    /// its expected type (e.g. a non-numeric `SERVER_PORT`).
    pub fn from_env() -> Result<Self, envy::Error> {
        // Does nothing if there is no .env file
        dotenvy::dotenv().ok();

        envy::from_env::<Config>()
    }

    /// Returns a setting only when it holds something other than whitespace.
    ///
    /// Hosting platforms commonly inject empty variables for unset secrets.
    pub fn non_empty(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}
