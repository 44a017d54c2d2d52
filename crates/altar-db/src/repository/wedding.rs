//! SurrealDB implementation of [`WeddingRepository`].
//!
//! Writes that touch more than one record run inside a single
//! `BEGIN`/`COMMIT` block so the wedding, its slug index entry, the
//! admin links and the admins' membership sets never drift apart.

use altar_core::error::AltarResult;
use altar_core::models::account::normalize_username;
use altar_core::models::wedding::{
    CreateWedding, LinkRole, Wedding, WeddingAdminLink, WeddingStatus,
};
use altar_core::repository::WeddingRepository;
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use tracing::{info, warn};
use uuid::Uuid;

use crate::convert::{now_millis, parse_uuid, timestamp};
use crate::error::{DbError, check_write};

const WEDDING_FIELDS: &str = "slug, display_name, status, owner_id, co_owner_ids, \
                              created_at, created_by, archived_at";

const LINK_FIELDS: &str = "wedding_id, username, role, added_at, added_by";

#[derive(Debug, Deserialize)]
struct WeddingRow {
    slug: String,
    display_name: String,
    status: String,
    owner_id: String,
    co_owner_ids: Vec<String>,
    created_at: i64,
    created_by: String,
    archived_at: Option<i64>,
}

impl WeddingRow {
    fn try_into_wedding(self, id: Uuid) -> Result<Wedding, DbError> {
        let status = WeddingStatus::parse(&self.status).ok_or_else(|| {
            DbError::InvalidRecord(format!("unknown wedding status: {}", self.status))
        })?;
        Ok(Wedding {
            id,
            slug: self.slug,
            display_name: self.display_name,
            status,
            owner_id: self.owner_id,
            co_owner_ids: self.co_owner_ids,
            created_at: timestamp(self.created_at)?,
            created_by: self.created_by,
            archived_at: self.archived_at.map(timestamp).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SlugRow {
    wedding_id: String,
}

#[derive(Debug, Deserialize)]
struct UpdatedRow {
    #[allow(dead_code)]
    username: String,
}

#[derive(Debug, Deserialize)]
struct LinkRow {
    wedding_id: String,
    username: String,
    role: String,
    added_at: i64,
    added_by: String,
}

impl LinkRow {
    fn try_into_link(self) -> Result<WeddingAdminLink, DbError> {
        let role = LinkRole::parse(&self.role)
            .ok_or_else(|| DbError::InvalidRecord(format!("unknown link role: {}", self.role)))?;
        Ok(WeddingAdminLink {
            wedding_id: parse_uuid(&self.wedding_id, "wedding")?,
            username: self.username,
            role,
            added_at: timestamp(self.added_at)?,
            added_by: self.added_by,
        })
    }
}

/// SurrealDB implementation of the wedding repository.
#[derive(Clone)]
pub struct SurrealWeddingRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealWeddingRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_link(
        &self,
        wedding_id: Uuid,
        username: &str,
    ) -> Result<Option<WeddingAdminLink>, DbError> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {LINK_FIELDS} FROM \
                 type::thing('wedding_admin_link', [$wedding_id, $username])"
            ))
            .bind(("wedding_id", wedding_id.to_string()))
            .bind(("username", username.to_string()))
            .await?;

        let rows: Vec<LinkRow> = result.take(0)?;
        rows.into_iter().next().map(LinkRow::try_into_link).transpose()
    }
}

impl<C: Connection> WeddingRepository for SurrealWeddingRepository<C> {
    async fn create_with_owner(&self, input: CreateWedding) -> AltarResult<Wedding> {
        let id = Uuid::new_v4();
        let owner = normalize_username(&input.owner_id);
        let created_at = now_millis();

        let response = self
            .db
            .query(
                "BEGIN TRANSACTION;
                 CREATE type::thing('wedding', $id) SET
                     slug = $slug, display_name = $display_name,
                     status = $status, owner_id = $owner,
                     co_owner_ids = $co_owner_ids, created_at = $now,
                     created_by = $created_by, archived_at = NONE
                     RETURN NONE;
                 CREATE type::thing('wedding_slug', $slug) SET
                     wedding_id = $id RETURN NONE;
                 CREATE type::thing('wedding_admin_link', [$id, $owner]) SET
                     wedding_id = $id, username = $owner, role = 'owner',
                     added_at = $now, added_by = $created_by RETURN NONE;
                 UPDATE type::thing('wedding_admin', $owner)
                     SET wedding_ids = array::union(wedding_ids, [$id])
                     RETURN NONE;
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("slug", input.slug.clone()))
            .bind(("display_name", input.display_name.clone()))
            .bind(("status", input.status.as_str()))
            .bind(("owner", owner.clone()))
            .bind(("co_owner_ids", input.co_owner_ids.clone()))
            .bind(("now", created_at))
            .bind(("created_by", input.created_by.clone()))
            .await
            .map_err(DbError::from)?;
        check_write(response, "wedding slug")?;

        info!(
            wedding_id = %id,
            slug = %input.slug,
            owner = %owner,
            created_by = %input.created_by,
            "Wedding created"
        );

        Ok(Wedding {
            id,
            slug: input.slug,
            display_name: input.display_name,
            status: input.status,
            owner_id: owner,
            co_owner_ids: input.co_owner_ids,
            created_at: timestamp(created_at)?,
            created_by: input.created_by,
            archived_at: None,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> AltarResult<Wedding> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {WEDDING_FIELDS} FROM type::thing('wedding', $id)"
            ))
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WeddingRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "wedding".into(),
            id: id.to_string(),
        })?;

        Ok(row.try_into_wedding(id)?)
    }

    async fn get_by_slug(&self, slug: &str) -> AltarResult<Wedding> {
        let slug = slug.trim().to_lowercase();
        let mut result = self
            .db
            .query("SELECT wedding_id FROM type::thing('wedding_slug', $slug)")
            .bind(("slug", slug.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SlugRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "wedding".into(),
            id: slug,
        })?;

        let id = parse_uuid(&row.wedding_id, "wedding")?;
        self.get_by_id(id).await
    }

    async fn archive(&self, id: Uuid) -> AltarResult<Wedding> {
        let current = self.get_by_id(id).await?;
        if current.is_archived() {
            return Ok(current);
        }

        self.db
            .query(
                "UPDATE type::thing('wedding', $id) \
                 SET status = 'archived', archived_at = $now \
                 WHERE status != 'archived' RETURN NONE",
            )
            .bind(("id", id.to_string()))
            .bind(("now", now_millis()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        info!(wedding_id = %id, slug = %current.slug, "Wedding archived");
        self.get_by_id(id).await
    }

    async fn link_admin(
        &self,
        wedding_id: Uuid,
        username: &str,
        added_by: &str,
    ) -> AltarResult<WeddingAdminLink> {
        let username = normalize_username(username);

        // Re-linking keeps the original link and only repairs membership.
        if let Some(existing) = self.find_link(wedding_id, &username).await? {
            self.db
                .query(
                    "UPDATE type::thing('wedding_admin', $username) \
                     SET wedding_ids = array::union(wedding_ids, [$wedding_id]) \
                     RETURN NONE",
                )
                .bind(("username", username.clone()))
                .bind(("wedding_id", wedding_id.to_string()))
                .await
                .map_err(DbError::from)?
                .check()
                .map_err(DbError::from)?;
            return Ok(existing);
        }

        let added_at = now_millis();
        let response = self
            .db
            .query(
                "BEGIN TRANSACTION;
                 CREATE type::thing('wedding_admin_link', [$wedding_id, $username]) SET
                     wedding_id = $wedding_id, username = $username,
                     role = 'staff', added_at = $now, added_by = $added_by
                     RETURN NONE;
                 UPDATE type::thing('wedding_admin', $username)
                     SET wedding_ids = array::union(wedding_ids, [$wedding_id])
                     RETURN NONE;
                 COMMIT TRANSACTION;",
            )
            .bind(("wedding_id", wedding_id.to_string()))
            .bind(("username", username.clone()))
            .bind(("now", added_at))
            .bind(("added_by", added_by.to_string()))
            .await
            .map_err(DbError::from)?;
        check_write(response, "wedding admin link")?;

        info!(
            wedding_id = %wedding_id,
            username = %username,
            added_by = %added_by,
            "Admin linked to wedding"
        );

        Ok(WeddingAdminLink {
            wedding_id,
            username,
            role: LinkRole::Staff,
            added_at: timestamp(added_at)?,
            added_by: added_by.to_string(),
        })
    }

    async fn unlink_admin(&self, wedding_id: Uuid, username: &str) -> AltarResult<()> {
        let username = normalize_username(username);

        let response = self
            .db
            .query(
                "BEGIN TRANSACTION;
                 DELETE type::thing('wedding_admin_link', [$wedding_id, $username]);
                 UPDATE type::thing('wedding_admin', $username)
                     SET wedding_ids = array::complement(wedding_ids, [$wedding_id])
                     RETURN NONE;
                 COMMIT TRANSACTION;",
            )
            .bind(("wedding_id", wedding_id.to_string()))
            .bind(("username", username.clone()))
            .await
            .map_err(DbError::from)?;
        check_write(response, "wedding admin link")?;

        info!(wedding_id = %wedding_id, username = %username, "Admin unlinked from wedding");
        Ok(())
    }

    async fn list_links(&self, wedding_id: Uuid) -> AltarResult<Vec<WeddingAdminLink>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {LINK_FIELDS} FROM wedding_admin_link \
                 WHERE wedding_id = $wedding_id ORDER BY added_at ASC, username ASC"
            ))
            .bind(("wedding_id", wedding_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LinkRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(LinkRow::try_into_link)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn reconcile_memberships(&self, wedding_id: Uuid) -> AltarResult<usize> {
        let links = self.list_links(wedding_id).await?;

        for link in &links {
            let mut response = self
                .db
                .query(
                    "UPDATE type::thing('wedding_admin', $username) \
                     SET wedding_ids = array::union(wedding_ids, [$wedding_id]) \
                     RETURN username",
                )
                .bind(("username", link.username.clone()))
                .bind(("wedding_id", wedding_id.to_string()))
                .await
                .map_err(DbError::from)?
                .check()
                .map_err(DbError::from)?;

            let updated: Vec<UpdatedRow> = response.take(0).map_err(DbError::from)?;
            if updated.is_empty() {
                warn!(
                    wedding_id = %wedding_id,
                    username = %link.username,
                    "Link references a missing wedding admin"
                );
            }
        }

        info!(wedding_id = %wedding_id, links = links.len(), "Memberships reconciled");
        Ok(links.len())
    }
}
