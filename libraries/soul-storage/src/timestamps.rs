//! Timestamp encoding
//!
//! Stored as fixed-width RFC 3339 text (`2025-01-31T12:00:00.000000Z`) so that
//! lexical order in SQL matches chronological order.

use crate::error::{Result, StorageError};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqliteRow, Row};

pub(crate) fn encode(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn now() -> String {
    encode(soul_core::time::now())
}

fn parse(column: &'static str, raw: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidTimestamp { column, value: raw })
}

/// Read a NOT NULL timestamp column
pub(crate) fn get(row: &SqliteRow, column: &'static str) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    parse(column, raw)
}

/// Read a nullable timestamp column
pub(crate) fn get_opt(row: &SqliteRow, column: &'static str) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|raw| parse(column, raw)).transpose()
}
