//! Lifecycle-aware access policy for weddings.
//!
//! Membership decides *who* may act on a wedding; this module adds the
//! lifecycle rules on top:
//!
//! | status   | public read | admin read | admin write            |
//! |----------|-------------|------------|------------------------|
//! | draft    | denied      | allowed    | allowed                |
//! | active   | allowed     | allowed    | allowed                |
//! | archived | denied      | allowed    | master/super-admin only |

use std::sync::Arc;

use altar_core::error::{AltarError, AltarResult};
use altar_core::models::identity::Identity;
use altar_core::models::wedding::{Wedding, WeddingStatus};
use altar_core::repository::{WeddingAdminRepository, WeddingRepository};
use http::HeaderMap;
use tracing::warn;
use uuid::Uuid;

use crate::directory::WeddingDirectory;
use crate::session::{MembershipLookup, SessionAuthenticator};

/// Who is asking to see a wedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Anonymous guest on the public microsite.
    Public,
    /// An authenticated admin that already passed the membership check.
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// Fail closed for absent weddings and hide non-public ones from guests.
///
/// Archived weddings are refused for every audience; drafts are refused
/// for guests only.
pub fn require_active_wedding(
    wedding: Option<Wedding>,
    audience: Audience,
) -> AltarResult<Wedding> {
    let Some(wedding) = wedding else {
        return Err(AltarError::not_found("wedding", "unknown"));
    };
    match (wedding.status, audience) {
        (WeddingStatus::Archived, _) => Err(AltarError::forbidden("Wedding is archived")),
        (WeddingStatus::Draft, Audience::Public) => {
            Err(AltarError::forbidden("Wedding is not published"))
        }
        _ => Ok(wedding),
    }
}

/// Archived weddings are writable only by master and super-admins.
pub fn require_admin_accessible_wedding(
    wedding: &Wedding,
    is_super_admin: bool,
) -> AltarResult<()> {
    if wedding.is_archived() && !is_super_admin {
        return Err(AltarError::forbidden("Access denied: wedding is archived"));
    }
    Ok(())
}

/// Parse a wedding id taken from a path or query parameter.
pub fn parse_wedding_id(raw: &str) -> AltarResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AltarError::validation("Invalid wedding id"))
}

/// Turn a lookup result into the `Option` expected by
/// [`require_active_wedding`], keeping collaborator failures as errors.
fn optional(lookup: AltarResult<Wedding>) -> AltarResult<Option<Wedding>> {
    match lookup {
        Ok(wedding) => Ok(Some(wedding)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Combines session authentication, live membership, and lifecycle
/// rules into the single decision tenant-scoped handlers consume.
pub struct WeddingAccessPolicy<M, R, A>
where
    M: MembershipLookup,
    R: WeddingRepository,
    A: WeddingAdminRepository,
{
    sessions: Arc<SessionAuthenticator<M>>,
    directory: Arc<WeddingDirectory<R, A>>,
}

impl<M, R, A> WeddingAccessPolicy<M, R, A>
where
    M: MembershipLookup,
    R: WeddingRepository,
    A: WeddingAdminRepository,
{
    pub fn new(
        sessions: Arc<SessionAuthenticator<M>>,
        directory: Arc<WeddingDirectory<R, A>>,
    ) -> Self {
        Self {
            sessions,
            directory,
        }
    }

    /// Resolve a slug for a guest-facing page.
    pub async fn public_wedding(&self, slug: &str) -> AltarResult<Wedding> {
        let wedding = optional(self.directory.resolve_slug(slug).await)?;
        require_active_wedding(wedding, Audience::Public)
    }

    /// Authorize an admin request against a wedding.
    ///
    /// Order: token, membership, existence, lifecycle. A non-member gets
    /// 403 before learning whether the wedding exists.
    pub async fn authorize_admin(
        &self,
        headers: &HeaderMap,
        wedding_id: Uuid,
        mode: AccessMode,
    ) -> AltarResult<(Identity, Wedding)> {
        let identity = self
            .sessions
            .require_wedding_access(headers, wedding_id)
            .await?;
        let wedding = self.directory.get(wedding_id).await?;
        if mode == AccessMode::Write {
            require_admin_accessible_wedding(&wedding, identity.is_privileged()).inspect_err(
                |_| {
                    warn!(
                        %wedding_id,
                        subject = %identity.subject,
                        "Write to archived wedding refused"
                    );
                },
            )?;
        }
        Ok((identity, wedding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn wedding(status: WeddingStatus) -> Wedding {
        Wedding {
            id: Uuid::new_v4(),
            slug: "anna-and-ben".into(),
            display_name: "Anna & Ben".into(),
            status,
            owner_id: "anna".into(),
            co_owner_ids: vec![],
            created_at: Utc::now(),
            created_by: "master".into(),
            archived_at: None,
        }
    }

    #[test]
    fn absent_wedding_is_not_found() {
        let err = require_active_wedding(None, Audience::Public).unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn guests_see_only_active_weddings() {
        let active = Some(wedding(WeddingStatus::Active));
        assert!(require_active_wedding(active, Audience::Public).is_ok());
        for status in [WeddingStatus::Draft, WeddingStatus::Archived] {
            let err = require_active_wedding(Some(wedding(status)), Audience::Public)
                .unwrap_err();
            assert_eq!(err.status_code(), 403);
        }
    }

    #[test]
    fn admins_see_drafts_but_not_archived() {
        let draft = Some(wedding(WeddingStatus::Draft));
        assert!(require_active_wedding(draft, Audience::Admin).is_ok());
        let archived = Some(wedding(WeddingStatus::Archived));
        let err = require_active_wedding(archived, Audience::Admin).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn archived_is_writable_only_by_super() {
        let archived = wedding(WeddingStatus::Archived);
        let err = require_admin_accessible_wedding(&archived, false).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.code(), "ACCESS_DENIED");
        assert!(require_admin_accessible_wedding(&archived, true).is_ok());

        for status in [WeddingStatus::Draft, WeddingStatus::Active] {
            assert!(require_admin_accessible_wedding(&wedding(status), false).is_ok());
        }
    }

    #[test]
    fn wedding_ids_must_be_uuids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_wedding_id(&format!(" {id} ")).unwrap(), id);
        assert_eq!(parse_wedding_id("anna-and-ben").unwrap_err().status_code(), 400);
    }
}
