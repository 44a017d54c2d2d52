//! Identity providers, one per account namespace.
//!
//! The resolver asks each provider in turn. A provider that owns the
//! username (the record exists) decides the outcome even when the
//! password is wrong, so a name present in two namespaces is always
//! settled by namespace priority rather than by trying every password.

use altar_core::error::AltarResult;
use altar_core::models::account::WeddingAdminType;
use altar_core::models::identity::{Identity, Role};
use altar_core::repository::{LegacyAdminRepository, SuperAdminRepository, WeddingAdminRepository};
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::config::{AuthConfig, MASTER_USERNAME};
use crate::password;

/// Identity produced by a successful password check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub identity: Identity,
    /// Membership at login time, returned to the client.
    pub wedding_ids: Vec<Uuid>,
    pub must_change_password: bool,
}

impl ResolvedIdentity {
    fn privileged(subject: &str, role: Role) -> Self {
        Self {
            identity: Identity::new(subject, role),
            wedding_ids: Vec::new(),
            must_change_password: false,
        }
    }
}

/// Result of asking one namespace about a username/password pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    Authenticated(ResolvedIdentity),
    /// The namespace owns the username but the password did not match.
    Rejected,
    /// The namespace has no such account; ask the next provider.
    NotFound,
}

impl ProviderOutcome {
    fn from_check(matched: bool, resolved: impl FnOnce() -> ResolvedIdentity) -> Self {
        if matched {
            Self::Authenticated(resolved())
        } else {
            Self::Rejected
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Namespace name, used in logs only.
    fn namespace(&self) -> &'static str;

    /// `username` is already normalized. Errors are reserved for
    /// collaborator failures.
    async fn try_authenticate(&self, username: &str, password: &str)
    -> AltarResult<ProviderOutcome>;
}

/// Unwrap a repository lookup, turning "not found" into `None`.
fn found<T>(lookup: AltarResult<T>) -> AltarResult<Option<T>> {
    match lookup {
        Ok(record) => Ok(Some(record)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// Master
// ---------------------------------------------------------------------------

/// The configuration-backed `master` account.
pub struct MasterProvider {
    master_password: String,
}

impl MasterProvider {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            master_password: config.master_password.clone(),
        }
    }
}

#[async_trait]
impl IdentityProvider for MasterProvider {
    fn namespace(&self) -> &'static str {
        "master"
    }

    async fn try_authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> AltarResult<ProviderOutcome> {
        if username != MASTER_USERNAME {
            return Ok(ProviderOutcome::NotFound);
        }
        if self.master_password.is_empty() {
            debug!("master login attempted but no master password is configured");
            return Ok(ProviderOutcome::Rejected);
        }
        let matched = password::secrets_match(password, &self.master_password);
        Ok(ProviderOutcome::from_check(matched, || {
            ResolvedIdentity::privileged(username, Role::Master)
        }))
    }
}

// ---------------------------------------------------------------------------
// Super-admins
// ---------------------------------------------------------------------------

pub struct SuperAdminProvider<R: SuperAdminRepository> {
    repo: R,
    pepper: Option<String>,
}

impl<R: SuperAdminRepository> SuperAdminProvider<R> {
    pub fn new(repo: R, config: &AuthConfig) -> Self {
        Self {
            repo,
            pepper: config.pepper.clone(),
        }
    }
}

#[async_trait]
impl<R: SuperAdminRepository> IdentityProvider for SuperAdminProvider<R> {
    fn namespace(&self) -> &'static str {
        "super_admin"
    }

    async fn try_authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> AltarResult<ProviderOutcome> {
        let Some(admin) = found(self.repo.get_by_username(username).await)? else {
            return Ok(ProviderOutcome::NotFound);
        };
        let matched =
            password::verify_password(password, &admin.password_hash, self.pepper.as_deref())?;
        Ok(ProviderOutcome::from_check(matched, || {
            ResolvedIdentity::privileged(&admin.username, Role::Super)
        }))
    }
}

// ---------------------------------------------------------------------------
// Wedding admins
// ---------------------------------------------------------------------------

pub struct WeddingAdminProvider<R: WeddingAdminRepository> {
    repo: R,
    pepper: Option<String>,
}

impl<R: WeddingAdminRepository> WeddingAdminProvider<R> {
    pub fn new(repo: R, config: &AuthConfig) -> Self {
        Self {
            repo,
            pepper: config.pepper.clone(),
        }
    }
}

#[async_trait]
impl<R: WeddingAdminRepository> IdentityProvider for WeddingAdminProvider<R> {
    fn namespace(&self) -> &'static str {
        "wedding_admin"
    }

    async fn try_authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> AltarResult<ProviderOutcome> {
        let Some(admin) = found(self.repo.get_by_username(username).await)? else {
            return Ok(ProviderOutcome::NotFound);
        };
        let matched =
            password::verify_password(password, &admin.password_hash, self.pepper.as_deref())?;
        let role = match admin.user_type {
            WeddingAdminType::Client => Role::WeddingClient,
            WeddingAdminType::Staff => Role::WeddingStaff,
        };
        Ok(ProviderOutcome::from_check(matched, || ResolvedIdentity {
            identity: Identity::new(admin.username.clone(), role),
            wedding_ids: admin.wedding_ids.clone(),
            must_change_password: admin.must_change_password,
        }))
    }
}

// ---------------------------------------------------------------------------
// Legacy admins
// ---------------------------------------------------------------------------

pub struct LegacyAdminProvider<R: LegacyAdminRepository> {
    repo: R,
    pepper: Option<String>,
    legacy_wedding_id: Option<Uuid>,
}

impl<R: LegacyAdminRepository> LegacyAdminProvider<R> {
    pub fn new(repo: R, config: &AuthConfig) -> Self {
        Self {
            repo,
            pepper: config.pepper.clone(),
            legacy_wedding_id: config.legacy_wedding_id,
        }
    }
}

#[async_trait]
impl<R: LegacyAdminRepository> IdentityProvider for LegacyAdminProvider<R> {
    fn namespace(&self) -> &'static str {
        "legacy_admin"
    }

    async fn try_authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> AltarResult<ProviderOutcome> {
        let Some(admin) = found(self.repo.get_by_username(username).await)? else {
            return Ok(ProviderOutcome::NotFound);
        };
        let matched =
            password::verify_password(password, &admin.password_hash, self.pepper.as_deref())?;
        Ok(ProviderOutcome::from_check(matched, || ResolvedIdentity {
            identity: Identity::new(admin.username.clone(), Role::Legacy),
            wedding_ids: self.legacy_wedding_id.into_iter().collect(),
            must_change_password: admin.must_change_password,
        }))
    }
}
