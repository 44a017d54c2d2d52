//! Account records for the identity namespaces stored in the database.
//!
//! The master account is not a record: it lives in configuration and is
//! resolved by the auth crate directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AltarError, AltarResult};

/// Username of the configuration-backed master account. No stored
/// account may take it.
pub const MASTER_USERNAME: &str = "master";

/// Canonical form of a username: trimmed and lowercased.
///
/// Every lookup and every stored record uses this form.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalize a username for a new stored account.
///
/// Rejects blank names, embedded whitespace and the reserved master name.
pub fn validated_username(raw: &str) -> AltarResult<String> {
    let username = normalize_username(raw);
    if username.is_empty() {
        return Err(AltarError::validation("Username is required"));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AltarError::validation("Username must not contain whitespace"));
    }
    if username == MASTER_USERNAME {
        return Err(AltarError::validation(format!(
            "Username '{MASTER_USERNAME}' is reserved"
        )));
    }
    Ok(username)
}

/// Platform-wide administrator with implicit access to every wedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperAdmin {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSuperAdmin {
    pub username: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub email: Option<String>,
    pub created_by: String,
}

/// Kind of wedding-scoped administrator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeddingAdminType {
    /// The couple's own account, created alongside a wedding.
    #[default]
    Client,
    /// Reusable planner/staff account linked to many weddings.
    Staff,
}

impl WeddingAdminType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Staff => "staff",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "client" => Some(Self::Client),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }
}

/// Administrator whose access is limited to `wedding_ids`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeddingAdmin {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub wedding_ids: Vec<Uuid>,
    pub user_type: WeddingAdminType,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWeddingAdmin {
    pub username: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub email: Option<String>,
    pub user_type: WeddingAdminType,
    pub must_change_password: bool,
    pub created_by: String,
}

/// Pre-multi-tenant administrator, implicitly scoped to the single
/// wedding that existed before migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyAdmin {
    pub username: String,
    pub password_hash: String,
    pub must_change_password: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLegacyAdmin {
    pub username: String,
    pub password: String,
    pub must_change_password: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_are_trimmed_and_lowercased() {
        assert_eq!(normalize_username("  Alice "), "alice");
        assert_eq!(normalize_username("MASTER"), "master");
    }

    #[test]
    fn blank_username_is_rejected() {
        let err = validated_username("   ").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(validated_username("jo ann").is_err());
    }

    #[test]
    fn master_username_is_reserved() {
        let err = validated_username(" Master ").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("reserved"));
        assert_eq!(validated_username("mastermind").unwrap(), "mastermind");
    }

    #[test]
    fn admin_type_defaults_to_client() {
        assert_eq!(WeddingAdminType::default(), WeddingAdminType::Client);
        assert_eq!(WeddingAdminType::parse("staff"), Some(WeddingAdminType::Staff));
        assert_eq!(WeddingAdminType::parse("owner"), None);
    }
}
