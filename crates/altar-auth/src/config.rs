//! Authentication configuration.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use altar_core::models::account::MASTER_USERNAME;

/// Configuration for the authentication core.
///
/// Token lifetimes are fixed constants in [`crate::token`].
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC-SHA256 key used to sign bearer tokens.
    pub token_secret: String,
    /// Password of the `master` account. Empty disables master login.
    pub master_password: String,
    /// Wedding that legacy (pre-multi-tenant) admins are scoped to.
    pub legacy_wedding_id: Option<Uuid>,
    /// Optional pepper prepended to passwords before Argon2id verification.
    pub pepper: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"[REDACTED]")
            .field("master_password", &"[REDACTED]")
            .field("legacy_wedding_id", &self.legacy_wedding_id)
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
