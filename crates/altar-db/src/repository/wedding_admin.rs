//! SurrealDB implementation of [`WeddingAdminRepository`].

use altar_core::error::AltarResult;
use altar_core::models::account::{
    CreateWeddingAdmin, WeddingAdmin, WeddingAdminType, validated_username,
};
use altar_core::repository::WeddingAdminRepository;
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use tracing::info;
use uuid::Uuid;

use crate::convert::{now_millis, parse_uuids, timestamp};
use crate::error::{DbError, check_write};
use crate::password::hash_password;

const FIELDS: &str = "username, password_hash, email, wedding_ids, user_type, \
                      must_change_password, created_at, created_by";

#[derive(Debug, Deserialize)]
struct WeddingAdminRow {
    username: String,
    password_hash: String,
    email: Option<String>,
    wedding_ids: Vec<String>,
    user_type: String,
    must_change_password: bool,
    created_at: i64,
    created_by: String,
}

impl WeddingAdminRow {
    fn try_into_admin(self) -> Result<WeddingAdmin, DbError> {
        let user_type = WeddingAdminType::parse(&self.user_type).ok_or_else(|| {
            DbError::InvalidRecord(format!("unknown admin type: {}", self.user_type))
        })?;
        Ok(WeddingAdmin {
            wedding_ids: parse_uuids(&self.wedding_ids, "wedding")?,
            username: self.username,
            password_hash: self.password_hash,
            email: self.email,
            user_type,
            must_change_password: self.must_change_password,
            created_at: timestamp(self.created_at)?,
            created_by: self.created_by,
        })
    }
}

/// SurrealDB implementation of the wedding-admin repository.
#[derive(Clone)]
pub struct SurrealWeddingAdminRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealWeddingAdminRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }

    /// Apply a membership update and read the account back. UPDATE on a
    /// missing record matches nothing, so the read reports NotFound.
    async fn update_memberships(
        &self,
        statement: &str,
        username: &str,
        wedding_id: Uuid,
    ) -> AltarResult<WeddingAdmin> {
        self.db
            .query(statement)
            .bind(("username", username.to_string()))
            .bind(("wedding_id", wedding_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        self.get_by_username(username).await
    }
}

impl<C: Connection> WeddingAdminRepository for SurrealWeddingAdminRepository<C> {
    async fn create(&self, input: CreateWeddingAdmin) -> AltarResult<WeddingAdmin> {
        let username = validated_username(&input.username)?;
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;
        let created_at = now_millis();

        let response = self
            .db
            .query(
                "CREATE type::thing('wedding_admin', $username) SET \
                 username = $username, password_hash = $password_hash, \
                 email = $email, wedding_ids = [], user_type = $user_type, \
                 must_change_password = $must_change_password, \
                 created_at = $created_at, created_by = $created_by \
                 RETURN NONE",
            )
            .bind(("username", username.clone()))
            .bind(("password_hash", password_hash.clone()))
            .bind(("email", input.email.clone()))
            .bind(("user_type", input.user_type.as_str()))
            .bind(("must_change_password", input.must_change_password))
            .bind(("created_at", created_at))
            .bind(("created_by", input.created_by.clone()))
            .await
            .map_err(DbError::from)?;
        check_write(response, "wedding admin")?;

        info!(
            username = %username,
            user_type = input.user_type.as_str(),
            "Wedding admin created"
        );

        Ok(WeddingAdmin {
            username,
            password_hash,
            email: input.email,
            wedding_ids: Vec::new(),
            user_type: input.user_type,
            must_change_password: input.must_change_password,
            created_at: timestamp(created_at)?,
            created_by: input.created_by,
        })
    }

    async fn get_by_username(&self, username: &str) -> AltarResult<WeddingAdmin> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {FIELDS} FROM type::thing('wedding_admin', $username)"
            ))
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WeddingAdminRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "wedding admin".into(),
            id: username.to_string(),
        })?;

        Ok(row.try_into_admin()?)
    }

    async fn add_wedding(&self, username: &str, wedding_id: Uuid) -> AltarResult<WeddingAdmin> {
        self.update_memberships(
            "UPDATE type::thing('wedding_admin', $username) \
             SET wedding_ids = array::union(wedding_ids, [$wedding_id])",
            username,
            wedding_id,
        )
        .await
    }

    async fn remove_wedding(
        &self,
        username: &str,
        wedding_id: Uuid,
    ) -> AltarResult<WeddingAdmin> {
        self.update_memberships(
            "UPDATE type::thing('wedding_admin', $username) \
             SET wedding_ids = array::complement(wedding_ids, [$wedding_id])",
            username,
            wedding_id,
        )
        .await
    }

    async fn set_password(&self, username: &str, new_password: &str) -> AltarResult<()> {
        // Surface NotFound before spending a hash on a missing account.
        self.get_by_username(username).await?;
        let password_hash = hash_password(new_password, self.pepper.as_deref())?;

        self.db
            .query(
                "UPDATE type::thing('wedding_admin', $username) SET \
                 password_hash = $password_hash, must_change_password = false",
            )
            .bind(("username", username.to_string()))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        info!(username = %username, "Wedding admin password changed");
        Ok(())
    }

    async fn list_by_wedding(&self, wedding_id: Uuid) -> AltarResult<Vec<WeddingAdmin>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {FIELDS} FROM wedding_admin \
                 WHERE wedding_ids CONTAINS $wedding_id ORDER BY username ASC"
            ))
            .bind(("wedding_id", wedding_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WeddingAdminRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(WeddingAdminRow::try_into_admin)
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
