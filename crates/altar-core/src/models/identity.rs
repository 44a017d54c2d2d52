//! Authenticated identity handed to downstream handlers.

use serde::{Deserialize, Serialize};

/// Namespace an identity was resolved from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Master,
    Super,
    WeddingClient,
    WeddingStaff,
    Legacy,
}

impl Role {
    /// Master and super-admins bypass wedding membership checks.
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Master | Self::Super)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Super => "super",
            Self::WeddingClient => "wedding_client",
            Self::WeddingStaff => "wedding_staff",
            Self::Legacy => "legacy",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller identity decoded from a verified access token.
///
/// Only `subject` and `role` are trusted from the token. Wedding
/// membership is never carried here; it is looked up live for each
/// tenant-scoped check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub role: Role,
}

impl Identity {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_names() {
        assert_eq!(
            serde_json::to_string(&Role::WeddingStaff).unwrap(),
            "\"wedding_staff\""
        );
        let role: Role = serde_json::from_str("\"super\"").unwrap();
        assert_eq!(role, Role::Super);
        assert_eq!(Role::WeddingClient.to_string(), "wedding_client");
    }

    #[test]
    fn only_master_and_super_are_privileged() {
        assert!(Role::Master.is_privileged());
        assert!(Role::Super.is_privileged());
        assert!(!Role::WeddingClient.is_privileged());
        assert!(!Role::WeddingStaff.is_privileged());
        assert!(!Role::Legacy.is_privileged());
    }
}
