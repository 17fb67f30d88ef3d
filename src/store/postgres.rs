//! Direct PostgreSQL access to the `card_keys` table.
//!
//! Timestamps and day counts are selected as text and parsed here, so the
//! table may use `timestamp` or `timestamptz` and any integer or `numeric`
//! type for the day counts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{CardKeyStore, StoreError};
use crate::{
    db::DbPool,
    models::card_key::{CardKeyRecord, DayCount, LookupOutcome, parse_timestamp},
};

/// Card key store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgCardKeyStore {
    pool: DbPool,
}

impl PgCardKeyStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// A `card_keys` row with its loosely typed columns cast to text.
#[derive(Debug, sqlx::FromRow)]
struct CardKeyRow {
    key: String,
    is_active: bool,
    used_at: Option<String>,
    valid_from: String,
    valid_to: String,
    note: Option<String>,
    total_days: Option<String>,
    remaining_days: Option<String>,
}

impl TryFrom<CardKeyRow> for CardKeyRecord {
    type Error = String;

    fn try_from(row: CardKeyRow) -> Result<Self, Self::Error> {
        let timestamp = |column: &str, raw: &str| {
            parse_timestamp(raw).ok_or_else(|| format!("invalid {column} timestamp: {raw}"))
        };
        let days = |column: &str, raw: Option<String>| {
            raw.map(|raw| {
                raw.parse::<DayCount>()
                    .map_err(|e| format!("invalid {column} value {raw}: {e}"))
            })
            .transpose()
        };

        Ok(CardKeyRecord {
            used_at: row
                .used_at
                .as_deref()
                .map(|raw| timestamp("used_at", raw))
                .transpose()?,
            valid_from: timestamp("valid_from", &row.valid_from)?,
            valid_to: timestamp("valid_to", &row.valid_to)?,
            total_days: days("total_days", row.total_days)?,
            remaining_days: days("remaining_days", row.remaining_days)?,
            key: row.key,
            is_active: row.is_active,
            note: row.note,
        })
    }
}

#[async_trait]
impl CardKeyStore for PgCardKeyStore {
    async fn find_by_key(&self, key: &str) -> LookupOutcome {
        // LIMIT 2 is enough to tell "one" from "more than one"
        let rows = sqlx::query_as::<_, CardKeyRow>(
            r#"
            SELECT key,
                   is_active,
                   used_at::text AS used_at,
                   valid_from::text AS valid_from,
                   valid_to::text AS valid_to,
                   note,
                   total_days::text AS total_days,
                   remaining_days::text AS remaining_days
            FROM card_keys
            WHERE key = $1
            LIMIT 2
            "#,
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => return LookupOutcome::QueryError(StoreError::from(e).to_string()),
        };

        match rows
            .into_iter()
            .map(CardKeyRecord::try_from)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(records) => LookupOutcome::from_rows(records),
            Err(detail) => LookupOutcome::QueryError(detail),
        }
    }

    async fn server_time(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let now: Option<DateTime<Utc>> = sqlx::query_scalar("SELECT NOW()")
            .fetch_optional(&self.pool)
            .await?;

        Ok(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn row() -> CardKeyRow {
        CardKeyRow {
            key: "KMU8CZW7DZB71TB9".to_string(),
            is_active: true,
            used_at: None,
            valid_from: "2025-05-01 08:00:00+00".to_string(),
            valid_to: "2025-05-31 08:00:00".to_string(),
            note: None,
            total_days: Some("30".to_string()),
            remaining_days: Some("12.50".to_string()),
        }
    }

    #[test]
    fn naive_and_zoned_timestamps_are_read_as_utc() {
        let record = CardKeyRecord::try_from(CardKeyRow {
            used_at: Some("2025-05-02 10:00:00.25+02".to_string()),
            ..row()
        })
        .unwrap();

        assert_eq!(
            record.valid_from,
            Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap()
        );
        assert_eq!(
            record.valid_to,
            Utc.with_ymd_and_hms(2025, 5, 31, 8, 0, 0).unwrap()
        );
        assert!(record.used_at.is_some());
    }

    #[test]
    fn numeric_day_counts_are_kept() {
        let record = CardKeyRecord::try_from(row()).unwrap();

        assert_eq!(record.total_days, Some(DayCount::from(30)));
        assert_eq!(
            serde_json::to_value(&record.remaining_days).unwrap(),
            json!(12.5)
        );
    }

    #[test]
    fn unreadable_columns_are_reported() {
        let err = CardKeyRecord::try_from(CardKeyRow {
            valid_to: "infinity".to_string(),
            ..row()
        })
        .unwrap_err();
        assert!(err.contains("valid_to"));

        let err = CardKeyRecord::try_from(CardKeyRow {
            total_days: Some("NaN".to_string()),
            ..row()
        })
        .unwrap_err();
        assert!(err.contains("total_days"));
    }
}
