//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Account records are keyed by
//! normalized username; weddings by their immutable UUID. Creation of
//! uniquely keyed records is an atomic "create if absent" write that
//! fails with [`AltarError::AlreadyExists`](crate::error::AltarError)
//! instead of a read-then-write check.

use uuid::Uuid;

use crate::error::AltarResult;
use crate::models::{
    account::{
        CreateLegacyAdmin, CreateSuperAdmin, CreateWeddingAdmin, LegacyAdmin, SuperAdmin,
        WeddingAdmin,
    },
    wedding::{CreateWedding, Wedding, WeddingAdminLink},
};

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub trait SuperAdminRepository: Send + Sync {
    fn create(&self, input: CreateSuperAdmin)
    -> impl Future<Output = AltarResult<SuperAdmin>> + Send;
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = AltarResult<SuperAdmin>> + Send;
    fn list(&self) -> impl Future<Output = AltarResult<Vec<SuperAdmin>>> + Send;
    fn delete(&self, username: &str) -> impl Future<Output = AltarResult<()>> + Send;
}

pub trait WeddingAdminRepository: Send + Sync {
    fn create(
        &self,
        input: CreateWeddingAdmin,
    ) -> impl Future<Output = AltarResult<WeddingAdmin>> + Send;
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = AltarResult<WeddingAdmin>> + Send;

    /// Append a wedding id to the admin's membership set. Idempotent.
    fn add_wedding(
        &self,
        username: &str,
        wedding_id: Uuid,
    ) -> impl Future<Output = AltarResult<WeddingAdmin>> + Send;

    /// Remove a wedding id from the admin's membership set. Idempotent.
    fn remove_wedding(
        &self,
        username: &str,
        wedding_id: Uuid,
    ) -> impl Future<Output = AltarResult<WeddingAdmin>> + Send;

    /// Replace the password and clear `must_change_password`.
    fn set_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> impl Future<Output = AltarResult<()>> + Send;

    /// All admins whose membership set contains `wedding_id`.
    fn list_by_wedding(
        &self,
        wedding_id: Uuid,
    ) -> impl Future<Output = AltarResult<Vec<WeddingAdmin>>> + Send;
}

/// Accounts predating multi-tenancy. Read-mostly; `create` exists for
/// migration tooling and tests.
pub trait LegacyAdminRepository: Send + Sync {
    fn create(
        &self,
        input: CreateLegacyAdmin,
    ) -> impl Future<Output = AltarResult<LegacyAdmin>> + Send;
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = AltarResult<LegacyAdmin>> + Send;
}

// ---------------------------------------------------------------------------
// Weddings
// ---------------------------------------------------------------------------

pub trait WeddingRepository: Send + Sync {
    /// Create the wedding, its slug index entry and the owner link, and
    /// append the new id to the owner's membership set, all in one
    /// transaction. A taken slug fails the whole write.
    fn create_with_owner(
        &self,
        input: CreateWedding,
    ) -> impl Future<Output = AltarResult<Wedding>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AltarResult<Wedding>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = AltarResult<Wedding>> + Send;

    /// Set status to archived. Archiving an archived wedding is a no-op.
    fn archive(&self, id: Uuid) -> impl Future<Output = AltarResult<Wedding>> + Send;

    /// Link an additional admin: link record and membership append in
    /// one transaction.
    fn link_admin(
        &self,
        wedding_id: Uuid,
        username: &str,
        added_by: &str,
    ) -> impl Future<Output = AltarResult<WeddingAdminLink>> + Send;

    /// Inverse of [`link_admin`](Self::link_admin).
    fn unlink_admin(
        &self,
        wedding_id: Uuid,
        username: &str,
    ) -> impl Future<Output = AltarResult<()>> + Send;

    fn list_links(
        &self,
        wedding_id: Uuid,
    ) -> impl Future<Output = AltarResult<Vec<WeddingAdminLink>>> + Send;

    /// Re-apply every link of the wedding onto the linked admins'
    /// membership sets. Returns the number of links processed.
    fn reconcile_memberships(
        &self,
        wedding_id: Uuid,
    ) -> impl Future<Output = AltarResult<usize>> + Send;
}
