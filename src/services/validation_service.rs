//! Card key validation - the one piece of business logic in the service.
//!
//! # Flow
//!
//! 1. Look the key up in the store
//! 2. If it exists, ask the store for its clock (local clock as fallback)
//! 3. Evaluate the key's status at that instant
//!
//! The store is never written to.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::{
    error::AppError,
    models::card_key::{LookupOutcome, ValidationResult},
    store::CardKeyStore,
};

/// Validate `key` against the store.
///
/// # Returns
///
/// - A `valid: false` result without status when the key does not exist
/// - The evaluated result when exactly one record matches
///
/// # Errors
///
/// - `LookupFailed`: the store could not answer the lookup
pub async fn validate_key(store: &dyn CardKeyStore, key: &str) -> Result<ValidationResult, AppError> {
    let fingerprint = key_fingerprint(key);

    let record = match store.find_by_key(key).await {
        LookupOutcome::Found(record) => record,
        LookupOutcome::NotFound => {
            tracing::info!(key = %fingerprint, "card key not found");
            return Ok(ValidationResult::not_found());
        }
        LookupOutcome::QueryError(detail) => return Err(AppError::LookupFailed(detail)),
    };

    let now = trusted_now(store).await;
    let result = ValidationResult::for_record(record, now);

    if let Some(status) = result.status {
        tracing::info!(key = %fingerprint, status = status.as_str(), "card key validated");
    }

    Ok(result)
}

/// Current time according to the store.
///
/// A failed or empty answer falls back to this process's clock, so a clock
/// outage degrades accuracy instead of failing validation.
pub async fn trusted_now(store: &dyn CardKeyStore) -> DateTime<Utc> {
    match store.server_time().await {
        Ok(Some(now)) => now,
        Ok(None) => {
            tracing::warn!("store returned no server time, using local clock");
            Utc::now()
        }
        Err(e) => {
            tracing::warn!(error = %e, "server time query failed, using local clock");
            Utc::now()
        }
    }
}

/// Short SHA-256 fingerprint so logs can correlate requests without holding keys.
fn key_fingerprint(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..6])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::card_key::{
        CardKeyRecord, KeyStatus,
        tests::{active_record, now},
    };
    use crate::store::scripted::{ScriptedLookup, ScriptedStore};
    use chrono::Duration;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn not_found_skips_the_clock() {
        let store = ScriptedStore::new(ScriptedLookup::NotFound).with_time(now());

        let result = validate_key(&store, "NOPE").await.unwrap();

        assert!(!result.valid);
        assert!(result.status.is_none());
        assert!(result.details.is_none());
        assert_eq!(store.time_queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn found_key_is_evaluated_at_store_time() {
        let record = CardKeyRecord {
            valid_to: now() + Duration::seconds(1),
            ..active_record("K1")
        };
        let store = ScriptedStore::new(ScriptedLookup::Found(record)).with_time(now());

        let result = validate_key(&store, "K1").await.unwrap();

        assert!(result.valid);
        assert_eq!(result.status, Some(KeyStatus::Active));
        let details = result.details.unwrap();
        assert_eq!(details.current_server_time, "2025-06-01T12:00:00.000Z");
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(store.time_queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lookup_failure_becomes_lookup_failed() {
        let store = ScriptedStore::new(ScriptedLookup::Fail("timeout".to_string()));

        let err = validate_key(&store, "K1").await.unwrap_err();

        assert!(matches!(err, AppError::LookupFailed(ref d) if d == "timeout"));
        assert_eq!(store.time_queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_clock_falls_back_to_local_time() {
        // Window around the real clock so the local fallback lands inside it
        let local = Utc::now();
        let record = CardKeyRecord {
            valid_from: local - Duration::hours(1),
            valid_to: local + Duration::hours(1),
            ..active_record("K1")
        };
        let store = ScriptedStore::new(ScriptedLookup::Found(record)).with_failing_time();

        let result = validate_key(&store, "K1").await.unwrap();

        assert_eq!(result.status, Some(KeyStatus::Active));
    }

    #[tokio::test]
    async fn empty_clock_answer_falls_back_to_local_time() {
        let store = ScriptedStore::new(ScriptedLookup::NotFound);
        let before = Utc::now();

        let now = trusted_now(&store).await;

        assert!(now >= before && now <= Utc::now());
    }

    #[tokio::test]
    async fn repeated_validation_is_stable() {
        let record = CardKeyRecord {
            used_at: Some(now() - Duration::days(2)),
            ..active_record("K1")
        };
        let store = ScriptedStore::new(ScriptedLookup::Found(record)).with_time(now());

        let first = validate_key(&store, "K1").await.unwrap();
        let second = validate_key(&store, "K1").await.unwrap();

        assert_eq!(first.status, Some(KeyStatus::Used));
        assert_eq!(first.status, second.status);
        assert_eq!(first.valid, second.valid);
    }

    #[test]
    fn fingerprint_is_short_and_stable() {
        let a = key_fingerprint("HN7HC3MEZH9Y7AZ8");

        assert_eq!(a.len(), 12);
        assert_eq!(a, key_fingerprint("HN7HC3MEZH9Y7AZ8"));
        assert_ne!(a, key_fingerprint("7ZN24RMPJ4KDEAY9"));
    }
}
