//! Conversions between stored scalar forms and domain types.
//!
//! UUIDs are stored as strings and timestamps as epoch milliseconds.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbError;

pub(crate) fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::InvalidRecord(format!("invalid {what} UUID: {e}")))
}

pub(crate) fn parse_uuids(raw: &[String], what: &str) -> Result<Vec<Uuid>, DbError> {
    raw.iter().map(|s| parse_uuid(s, what)).collect()
}

pub(crate) fn timestamp(millis: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| DbError::InvalidRecord(format!("timestamp out of range: {millis}")))
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
