//! Database-specific error types and conversions.

use std::collections::HashMap;

use altar_core::error::AltarError;
use surrealdb::Response;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Cannot reach SurrealDB: {0}")]
    Connect(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Stored record is invalid: {0}")]
    InvalidRecord(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    Conflict { entity: String },

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

impl From<DbError> for AltarError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AltarError::NotFound { entity, id },
            DbError::Conflict { entity } => AltarError::AlreadyExists { entity },
            DbError::Hash(msg) => AltarError::Crypto(msg),
            other => AltarError::Database(other.to_string()),
        }
    }
}

/// SurrealDB reports a taken record id as "already exists" and a unique
/// index violation as "already contains".
fn is_conflict(message: &str) -> bool {
    message.contains("already exists") || message.contains("already contains")
}

/// Check every statement of a write for errors.
///
/// A failed transaction marks all of its statements as failed, so the
/// whole error set is inspected rather than the first entry: any
/// uniqueness violation becomes [`DbError::Conflict`] for `entity`.
pub(crate) fn check_write(mut response: Response, entity: &str) -> Result<Response, DbError> {
    let errors: HashMap<usize, surrealdb::Error> = response.take_errors();
    if errors.is_empty() {
        return Ok(response);
    }
    if errors.values().any(|e| is_conflict(&e.to_string())) {
        return Err(DbError::Conflict {
            entity: entity.into(),
        });
    }
    let mut ordered: Vec<(usize, surrealdb::Error)> = errors.into_iter().collect();
    ordered.sort_by_key(|(index, _)| *index);
    let detail = ordered
        .into_iter()
        .map(|(index, e)| format!("statement {index}: {e}"))
        .collect::<Vec<_>>()
        .join("; ");
    Err(DbError::Query(detail))
}
