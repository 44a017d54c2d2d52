//! Wedding (tenant) domain model.
//!
//! A wedding is one microsite and the unit of data isolation. All guest
//! and admin content is scoped to a wedding id, which never changes once
//! assigned. The slug is the public, human-readable handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AltarError, AltarResult};

const SLUG_MIN_LEN: usize = 3;
const SLUG_MAX_LEN: usize = 63;

/// Lifecycle state. `Archived` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeddingStatus {
    Draft,
    Active,
    Archived,
}

impl WeddingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wedding {
    pub id: Uuid,
    /// URL-safe unique handle (e.g., `anna-and-ben`).
    pub slug: String,
    pub display_name: String,
    pub status: WeddingStatus,
    /// Username of the owning wedding admin.
    pub owner_id: String,
    pub co_owner_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Wedding {
    pub fn is_archived(&self) -> bool {
        self.status == WeddingStatus::Archived
    }
}

/// Fields required to create a wedding together with its owner link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWedding {
    pub slug: String,
    pub display_name: String,
    /// Initial status; only `Draft` or `Active` are accepted.
    pub status: WeddingStatus,
    pub owner_id: String,
    pub co_owner_ids: Vec<String>,
    pub created_by: String,
}

/// Role a wedding admin holds on a linked wedding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LinkRole {
    Owner,
    Staff,
}

impl LinkRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Staff => "staff",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Self::Owner),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }
}

/// Join record `(wedding_id, username)`, kept in step with the admin's
/// `wedding_ids`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeddingAdminLink {
    pub wedding_id: Uuid,
    pub username: String,
    pub role: LinkRole,
    pub added_at: DateTime<Utc>,
    pub added_by: String,
}

/// Normalize a slug and check it is lowercase ASCII letters, digits and
/// interior hyphens, 3 to 63 characters long.
pub fn validate_slug(raw: &str) -> AltarResult<String> {
    let slug = raw.trim().to_lowercase();
    if slug.len() < SLUG_MIN_LEN || slug.len() > SLUG_MAX_LEN {
        return Err(AltarError::validation(format!(
            "Slug must be between {SLUG_MIN_LEN} and {SLUG_MAX_LEN} characters"
        )));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(AltarError::validation(
            "Slug may only contain lowercase letters, digits and hyphens",
        ));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(AltarError::validation(
            "Slug must not start or end with a hyphen",
        ));
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_slugs_are_normalized() {
        assert_eq!(validate_slug(" Anna-And-Ben ").unwrap(), "anna-and-ben");
        assert_eq!(validate_slug("a2b").unwrap(), "a2b");
    }

    #[test]
    fn invalid_slugs_are_rejected() {
        for bad in ["ab", "-anna", "anna-", "anna_ben", "anna ben", "ännа"] {
            let err = validate_slug(bad).unwrap_err();
            assert_eq!(err.status_code(), 400, "slug {bad:?} should be rejected");
        }
        assert!(validate_slug(&"a".repeat(64)).is_err());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            WeddingStatus::Draft,
            WeddingStatus::Active,
            WeddingStatus::Archived,
        ] {
            assert_eq!(WeddingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(WeddingStatus::parse("deleted"), None);
    }
}
