//! Card key store access.
//!
//! The validator reads from one external table and asks the same store for its
//! clock. Both operations sit behind [`CardKeyStore`] so the HTTP layer gets an
//! explicitly constructed store instead of a process-wide client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::card_key::LookupOutcome;

pub mod postgres;
pub mod rest;

pub use postgres::PgCardKeyStore;
pub use rest::RestCardKeyStore;

/// Failures raised by store adapters.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid store url: {0}")]
    Url(#[from] url::ParseError),

    #[error("store responded with status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("store is not configured: {0}")]
    NotConfigured(&'static str),
}

/// Read-only access to card keys and the store's clock.
#[async_trait]
pub trait CardKeyStore: Send + Sync {
    /// Exact-match lookup by key. Never writes.
    async fn find_by_key(&self, key: &str) -> LookupOutcome;

    /// The store's current time, or `None` if it answered without one.
    async fn server_time(&self) -> Result<Option<DateTime<Utc>>, StoreError>;
}

#[cfg(test)]
pub(crate) mod scripted {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::models::card_key::CardKeyRecord;

    /// What the scripted store answers to a lookup.
    #[derive(Debug, Clone)]
    pub(crate) enum ScriptedLookup {
        NotFound,
        Found(CardKeyRecord),
        Fail(String),
        Panic,
    }

    /// Test double returning scripted records and times, counting every call.
    pub(crate) struct ScriptedStore {
        lookup: ScriptedLookup,
        time: Option<DateTime<Utc>>,
        time_fails: bool,
        pub(crate) lookups: AtomicUsize,
        pub(crate) time_queries: AtomicUsize,
    }

    impl ScriptedStore {
        pub(crate) fn new(lookup: ScriptedLookup) -> Self {
            Self {
                lookup,
                time: None,
                time_fails: false,
                lookups: AtomicUsize::new(0),
                time_queries: AtomicUsize::new(0),
            }
        }

        pub(crate) fn with_time(mut self, time: DateTime<Utc>) -> Self {
            self.time = Some(time);
            self
        }

        pub(crate) fn with_failing_time(mut self) -> Self {
            self.time_fails = true;
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.lookups.load(Ordering::SeqCst) + self.time_queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CardKeyStore for ScriptedStore {
        async fn find_by_key(&self, key: &str) -> LookupOutcome {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            match self.lookup.clone() {
                ScriptedLookup::NotFound => LookupOutcome::NotFound,
                ScriptedLookup::Found(record) if record.key == key => LookupOutcome::Found(record),
                ScriptedLookup::Found(_) => LookupOutcome::NotFound,
                ScriptedLookup::Fail(detail) => LookupOutcome::QueryError(detail),
                ScriptedLookup::Panic => panic!("scripted store panic"),
            }
        }

        async fn server_time(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
            self.time_queries.fetch_add(1, Ordering::SeqCst);
            if self.time_fails {
                return Err(StoreError::NotConfigured("scripted time failure"));
            }
            Ok(self.time)
        }
    }
}
