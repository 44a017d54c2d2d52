//! Per-request authentication from a bearer token.
//!
//! Verification is stateless except for wedding membership: role and
//! subject come from the signed token, while the set of weddings a
//! non-privileged caller may act on is fetched live on every check so
//! that a membership change takes effect within an access token's
//! lifetime.

use std::collections::HashSet;
use std::sync::Arc;

use altar_core::error::{AltarError, AltarResult};
use altar_core::models::identity::{Identity, Role};
use altar_core::repository::{LegacyAdminRepository, WeddingAdminRepository};
use http::HeaderMap;
use http::header::AUTHORIZATION;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::AuthError;
use crate::token::{TokenCodec, TokenType};

const BEARER_SCHEME: &str = "bearer";

/// Live lookup of the weddings an identity may act on.
pub trait MembershipLookup: Send + Sync {
    fn memberships(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = AltarResult<HashSet<Uuid>>> + Send;
}

/// [`MembershipLookup`] backed by the account repositories.
///
/// Wedding admins get their current `wedding_ids`; legacy admins get the
/// configured pre-migration wedding while their record still exists.
/// Missing records yield an empty set.
#[derive(Clone)]
pub struct AccountMembershipLookup<W: WeddingAdminRepository, L: LegacyAdminRepository> {
    wedding_admins: W,
    legacy_admins: L,
    legacy_wedding_id: Option<Uuid>,
}

impl<W: WeddingAdminRepository, L: LegacyAdminRepository> AccountMembershipLookup<W, L> {
    pub fn new(wedding_admins: W, legacy_admins: L, legacy_wedding_id: Option<Uuid>) -> Self {
        Self {
            wedding_admins,
            legacy_admins,
            legacy_wedding_id,
        }
    }
}

impl<W: WeddingAdminRepository, L: LegacyAdminRepository> MembershipLookup
    for AccountMembershipLookup<W, L>
{
    async fn memberships(&self, identity: &Identity) -> AltarResult<HashSet<Uuid>> {
        match identity.role {
            Role::Master | Role::Super => Ok(HashSet::new()),
            Role::WeddingClient | Role::WeddingStaff => {
                match self.wedding_admins.get_by_username(&identity.subject).await {
                    Ok(admin) => Ok(admin.wedding_ids.into_iter().collect()),
                    Err(e) if e.is_not_found() => Ok(HashSet::new()),
                    Err(e) => Err(e),
                }
            }
            Role::Legacy => match self.legacy_admins.get_by_username(&identity.subject).await {
                Ok(_) => Ok(self.legacy_wedding_id.into_iter().collect()),
                Err(e) if e.is_not_found() => Ok(HashSet::new()),
                Err(e) => Err(e),
            },
        }
    }
}

/// Extract the token from an `Authorization` header value.
///
/// Accepts `Bearer <token>` (scheme case-insensitive) and a raw token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Err(AuthError::MissingAuthorization);
    };
    let value = value.to_str().map_err(|_| AuthError::MalformedToken)?.trim();
    if value.is_empty() {
        return Err(AuthError::MissingAuthorization);
    }
    let token = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case(BEARER_SCHEME) => rest.trim(),
        None if value.eq_ignore_ascii_case(BEARER_SCHEME) => "",
        _ => value,
    };
    if token.is_empty() {
        return Err(AuthError::MissingAuthorization);
    }
    Ok(token)
}

pub struct SessionAuthenticator<M: MembershipLookup> {
    codec: Arc<TokenCodec>,
    membership: M,
}

impl<M: MembershipLookup> SessionAuthenticator<M> {
    pub fn new(codec: Arc<TokenCodec>, membership: M) -> Self {
        Self { codec, membership }
    }

    /// Verify the request's access token and return its identity.
    pub fn require_auth(&self, headers: &HeaderMap) -> AltarResult<Identity> {
        let token = bearer_token(headers)?;
        let claims = self
            .codec
            .verify(token, TokenType::Access)
            .inspect_err(|e| debug!(error = %e, "Access token rejected"))?;
        Ok(claims.identity())
    }

    pub fn require_master(&self, headers: &HeaderMap) -> AltarResult<Identity> {
        let identity = self.require_auth(headers)?;
        if identity.role != Role::Master {
            return Err(deny(&identity, "Master access required"));
        }
        Ok(identity)
    }

    /// Accepts master and super-admins.
    pub fn require_super_admin(&self, headers: &HeaderMap) -> AltarResult<Identity> {
        let identity = self.require_auth(headers)?;
        if !identity.is_privileged() {
            return Err(deny(&identity, "Super admin access required"));
        }
        Ok(identity)
    }

    /// Authenticate and check the caller may act on `wedding_id`.
    pub async fn require_wedding_access(
        &self,
        headers: &HeaderMap,
        wedding_id: Uuid,
    ) -> AltarResult<Identity> {
        let identity = self.require_auth(headers)?;
        self.check_membership(&identity, wedding_id).await?;
        Ok(identity)
    }

    /// Membership half of [`require_wedding_access`](Self::require_wedding_access)
    /// for an already authenticated identity.
    pub async fn check_membership(&self, identity: &Identity, wedding_id: Uuid) -> AltarResult<()> {
        if identity.is_privileged() {
            return Ok(());
        }
        let memberships = self.membership.memberships(identity).await?;
        if memberships.contains(&wedding_id) {
            Ok(())
        } else {
            Err(deny(identity, "Access denied"))
        }
    }
}

fn deny(identity: &Identity, reason: &str) -> AltarError {
    warn!(
        subject = %identity.subject,
        role = %identity.role,
        reason,
        "Request denied"
    );
    AltarError::forbidden(reason)
}
