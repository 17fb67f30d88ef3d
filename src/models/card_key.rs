//! Card key records and validation results.
//!
//! A card key is an opaque string that unlocks a time-limited activation
//! window. Records live in the external `card_keys` table; this service only
//! reads them and reports whether the key is usable right now.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Represents a card key record from the store.
///
/// # Database Table
///
/// Maps to the `card_keys` table with columns:
/// - `key`: Unique lookup string
/// - `is_active`: Administrative on/off switch
/// - `used_at`: When the key was consumed, if ever
/// - `valid_from` / `valid_to`: Activation window
/// - `note`: Free-form display text
/// - `total_days` / `remaining_days`: Precomputed by the issuing system
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardKeyRecord {
    pub key: String,

    /// Disabled keys are rejected regardless of their window.
    pub is_active: bool,

    /// A consumed key is rejected even inside its window.
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub used_at: Option<DateTime<Utc>>,

    #[serde(deserialize_with = "deserialize_timestamp")]
    pub valid_from: DateTime<Utc>,

    #[serde(deserialize_with = "deserialize_timestamp")]
    pub valid_to: DateTime<Utc>,

    #[serde(default)]
    pub note: Option<String>,

    #[serde(default)]
    pub total_days: Option<DayCount>,

    #[serde(default)]
    pub remaining_days: Option<DayCount>,
}

/// A day count as stored, integer or fractional, echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayCount(serde_json::Number);

impl From<i64> for DayCount {
    fn from(days: i64) -> Self {
        DayCount(days.into())
    }
}

impl FromStr for DayCount {
    type Err = serde_json::Error;

    /// Parse the text form of an integer or numeric column (`30`, `12.50`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<serde_json::Number>().map(DayCount)
    }
}

/// Outcome of reading a single card key from the store.
#[derive(Debug)]
pub enum LookupOutcome {
    /// No row matched the key.
    NotFound,
    /// Exactly one row matched.
    Found(CardKeyRecord),
    /// The lookup itself failed. The detail is for logs only.
    QueryError(String),
}

impl LookupOutcome {
    /// Interpret the rows returned for an exact-match query.
    ///
    /// Keys are unique in the store, so more than one row means the table is
    /// not in the shape we rely on and is reported as a query error.
    pub fn from_rows(mut rows: Vec<CardKeyRecord>) -> Self {
        match rows.len() {
            0 => LookupOutcome::NotFound,
            1 => LookupOutcome::Found(rows.remove(0)),
            n => LookupOutcome::QueryError(format!("expected at most one card key, got {n}")),
        }
    }
}

/// Status of a card key at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    Disabled,
    Used,
    Expired,
    Pending,
    Active,
}

impl KeyStatus {
    /// Resolve the status of `record` at `now`.
    ///
    /// Rules are checked in a fixed order and the first match wins:
    /// disabled, used, expired, pending, then active. A `now` equal to either
    /// end of the window counts as inside it.
    pub fn evaluate(record: &CardKeyRecord, now: DateTime<Utc>) -> Self {
        if !record.is_active {
            KeyStatus::Disabled
        } else if record.used_at.is_some() {
            KeyStatus::Used
        } else if record.valid_to < now {
            KeyStatus::Expired
        } else if record.valid_from > now {
            KeyStatus::Pending
        } else {
            KeyStatus::Active
        }
    }

    pub fn is_valid(self) -> bool {
        self == KeyStatus::Active
    }

    pub fn message(self) -> &'static str {
        match self {
            KeyStatus::Disabled => "card key is disabled",
            KeyStatus::Used => "card key has already been used",
            KeyStatus::Expired => "card key has expired",
            KeyStatus::Pending => "card key is not active yet",
            KeyStatus::Active => "card key is valid",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeyStatus::Disabled => "disabled",
            KeyStatus::Used => "used",
            KeyStatus::Expired => "expired",
            KeyStatus::Pending => "pending",
            KeyStatus::Active => "active",
        }
    }
}

/// Message returned when no record matches the key.
pub const NOT_FOUND_MESSAGE: &str = "card key does not exist";

/// Response body of `GET /api/validate`.
///
/// # Example (record found)
///
/// ```json
/// {
///   "valid": true,
///   "status": "active",
///   "message": "card key is valid",
///   "key": "HN7HC3MEZH9Y7AZ8",
///   "note": "annual",
///   "activated_at": "2025-01-01T00:00:00Z",
///   "expires_at": "2025-12-27T00:00:00Z",
///   "current_server_time": "2025-06-01T12:00:00.000Z",
///   "total_days": 360,
///   "remaining_days": 209
/// }
/// ```
///
/// # Example (no record)
///
/// ```json
/// { "valid": false, "message": "card key does not exist" }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub valid: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<KeyStatus>,

    pub message: String,

    /// Echoed record fields, absent when nothing matched.
    #[serde(flatten)]
    pub details: Option<KeyDetails>,
}

/// Record fields echoed back for a found key.
#[derive(Debug, Clone, Serialize)]
pub struct KeyDetails {
    pub key: String,
    pub note: Option<String>,
    pub activated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub current_server_time: String,
    pub total_days: Option<DayCount>,
    pub remaining_days: Option<DayCount>,
}

impl ValidationResult {
    pub fn not_found() -> Self {
        Self {
            valid: false,
            status: None,
            message: NOT_FOUND_MESSAGE.to_string(),
            details: None,
        }
    }

    /// Evaluate `record` at `now` and echo its fields.
    pub fn for_record(record: CardKeyRecord, now: DateTime<Utc>) -> Self {
        let status = KeyStatus::evaluate(&record, now);

        Self {
            valid: status.is_valid(),
            status: Some(status),
            message: status.message().to_string(),
            details: Some(KeyDetails {
                key: record.key,
                note: record.note,
                activated_at: record.valid_from,
                expires_at: record.valid_to,
                current_server_time: now.to_rfc3339_opts(SecondsFormat::Millis, true),
                total_days: record.total_days,
                remaining_days: record.remaining_days,
            }),
        }
    }
}

/// Parse a store timestamp.
///
/// Accepts RFC 3339 (`2025-01-01T00:00:00+00:00`) and naive values
/// (`2025-01-01T00:00:00` or `2025-01-01 00:00:00`), the latter read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Postgres text output uses a space separator and a short offset (+00)
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
        None => Ok(None),
    }
}
