//! Wedding directory: slug resolution and the privileged lifecycle
//! operations (creation, staff linking, archiving).

use altar_core::error::{AltarError, AltarResult};
use altar_core::models::account::{WeddingAdminType, normalize_username};
use altar_core::models::identity::Identity;
use altar_core::models::wedding::{
    CreateWedding, Wedding, WeddingAdminLink, WeddingStatus, validate_slug,
};
use altar_core::repository::{WeddingAdminRepository, WeddingRepository};
use tracing::info;
use uuid::Uuid;

fn require_privileged(identity: &Identity, action: &str) -> AltarResult<()> {
    if identity.is_privileged() {
        Ok(())
    } else {
        Err(AltarError::forbidden(format!(
            "Super admin access required to {action}"
        )))
    }
}

#[derive(Clone)]
pub struct WeddingDirectory<R: WeddingRepository, A: WeddingAdminRepository> {
    weddings: R,
    admins: A,
}

impl<R: WeddingRepository, A: WeddingAdminRepository> WeddingDirectory<R, A> {
    pub fn new(weddings: R, admins: A) -> Self {
        Self { weddings, admins }
    }

    /// Single lookup through the slug index.
    pub async fn resolve_slug(&self, slug: &str) -> AltarResult<Wedding> {
        self.weddings.get_by_slug(&slug.trim().to_lowercase()).await
    }

    pub async fn get(&self, wedding_id: Uuid) -> AltarResult<Wedding> {
        self.weddings.get_by_id(wedding_id).await
    }

    /// Create a wedding owned by an existing wedding admin.
    ///
    /// The initial status must be draft or active. The owner link and the
    /// owner's membership entry are written in the same transaction as the
    /// wedding itself.
    pub async fn create_wedding(
        &self,
        identity: &Identity,
        mut input: CreateWedding,
    ) -> AltarResult<Wedding> {
        require_privileged(identity, "create a wedding")?;

        input.slug = validate_slug(&input.slug)?;
        if input.status == WeddingStatus::Archived {
            return Err(AltarError::validation(
                "A wedding cannot be created in the archived state",
            ));
        }
        input.display_name = input.display_name.trim().to_string();
        if input.display_name.is_empty() {
            return Err(AltarError::validation("Display name is required"));
        }
        input.owner_id = normalize_username(&input.owner_id);
        input.co_owner_ids = input
            .co_owner_ids
            .iter()
            .map(|u| normalize_username(u))
            .filter(|u| !u.is_empty() && *u != input.owner_id)
            .collect();
        input.created_by = identity.subject.clone();

        // Surface a missing owner as 404 before touching the transaction.
        self.admins.get_by_username(&input.owner_id).await?;

        let wedding = self.weddings.create_with_owner(input).await?;
        info!(
            wedding_id = %wedding.id,
            slug = %wedding.slug,
            owner = %wedding.owner_id,
            created_by = %identity.subject,
            "Wedding created"
        );
        Ok(wedding)
    }

    /// Link a reusable staff account to a wedding.
    pub async fn link_staff(
        &self,
        identity: &Identity,
        wedding_id: Uuid,
        username: &str,
    ) -> AltarResult<WeddingAdminLink> {
        require_privileged(identity, "link staff")?;

        let username = normalize_username(username);
        let admin = self.admins.get_by_username(&username).await?;
        if admin.user_type != WeddingAdminType::Staff {
            return Err(AltarError::validation(
                "Only staff accounts can be linked to additional weddings",
            ));
        }
        self.weddings.get_by_id(wedding_id).await?;

        let link = self
            .weddings
            .link_admin(wedding_id, &username, &identity.subject)
            .await?;
        info!(%wedding_id, username = %username, "Staff linked to wedding");
        Ok(link)
    }

    /// Remove an admin's link and membership. The owner stays linked for
    /// the lifetime of the wedding.
    pub async fn unlink_admin(
        &self,
        identity: &Identity,
        wedding_id: Uuid,
        username: &str,
    ) -> AltarResult<()> {
        require_privileged(identity, "unlink an admin")?;
        let username = normalize_username(username);
        let wedding = self.weddings.get_by_id(wedding_id).await?;
        if wedding.owner_id == username {
            return Err(AltarError::validation(
                "The wedding owner cannot be unlinked",
            ));
        }
        self.weddings.unlink_admin(wedding_id, &username).await?;
        info!(%wedding_id, username = %username, "Admin unlinked from wedding");
        Ok(())
    }

    pub async fn admins_of(&self, wedding_id: Uuid) -> AltarResult<Vec<WeddingAdminLink>> {
        self.weddings.list_links(wedding_id).await
    }

    /// Archive a wedding. Terminal; repeating it is a no-op.
    pub async fn archive(&self, identity: &Identity, wedding_id: Uuid) -> AltarResult<Wedding> {
        require_privileged(identity, "archive a wedding")?;
        let wedding = self.weddings.archive(wedding_id).await?;
        info!(%wedding_id, archived_by = %identity.subject, "Wedding archived");
        Ok(wedding)
    }

    /// Re-apply the wedding's admin links onto the admins' membership
    /// sets, repairing records written by a partially failed linkage.
    pub async fn reconcile_memberships(
        &self,
        identity: &Identity,
        wedding_id: Uuid,
    ) -> AltarResult<usize> {
        require_privileged(identity, "reconcile memberships")?;
        let repaired = self.weddings.reconcile_memberships(wedding_id).await?;
        info!(%wedding_id, links = repaired, "Wedding memberships reconciled");
        Ok(repaired)
    }
}
