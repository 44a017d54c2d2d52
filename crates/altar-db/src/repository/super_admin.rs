//! SurrealDB implementation of [`SuperAdminRepository`].

use altar_core::error::AltarResult;
use altar_core::models::account::{CreateSuperAdmin, SuperAdmin, validated_username};
use altar_core::repository::SuperAdminRepository;
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::convert::{now_millis, timestamp};
use crate::error::{DbError, check_write};
use crate::password::hash_password;

const FIELDS: &str = "username, password_hash, email, created_at, created_by";

#[derive(Debug, Deserialize)]
struct SuperAdminRow {
    username: String,
    password_hash: String,
    email: Option<String>,
    created_at: i64,
    created_by: String,
}

impl SuperAdminRow {
    fn try_into_admin(self) -> Result<SuperAdmin, DbError> {
        Ok(SuperAdmin {
            username: self.username,
            password_hash: self.password_hash,
            email: self.email,
            created_at: timestamp(self.created_at)?,
            created_by: self.created_by,
        })
    }
}

/// SurrealDB implementation of the super-admin repository.
#[derive(Clone)]
pub struct SurrealSuperAdminRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealSuperAdminRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }
}

impl<C: Connection> SuperAdminRepository for SurrealSuperAdminRepository<C> {
    async fn create(&self, input: CreateSuperAdmin) -> AltarResult<SuperAdmin> {
        let username = validated_username(&input.username)?;
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;
        let created_at = now_millis();

        // CREATE on the username key fails if the record exists.
        let response = self
            .db
            .query(
                "CREATE type::thing('super_admin', $username) SET \
                 username = $username, password_hash = $password_hash, \
                 email = $email, created_at = $created_at, \
                 created_by = $created_by RETURN NONE",
            )
            .bind(("username", username.clone()))
            .bind(("password_hash", password_hash.clone()))
            .bind(("email", input.email.clone()))
            .bind(("created_at", created_at))
            .bind(("created_by", input.created_by.clone()))
            .await
            .map_err(DbError::from)?;
        check_write(response, "super admin")?;

        info!(username = %username, created_by = %input.created_by, "Super admin created");

        Ok(SuperAdmin {
            username,
            password_hash,
            email: input.email,
            created_at: timestamp(created_at)?,
            created_by: input.created_by,
        })
    }

    async fn get_by_username(&self, username: &str) -> AltarResult<SuperAdmin> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {FIELDS} FROM type::thing('super_admin', $username)"
            ))
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SuperAdminRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "super admin".into(),
            id: username.to_string(),
        })?;

        Ok(row.try_into_admin()?)
    }

    async fn list(&self) -> AltarResult<Vec<SuperAdmin>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {FIELDS} FROM super_admin ORDER BY username ASC"
            ))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SuperAdminRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(SuperAdminRow::try_into_admin)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn delete(&self, username: &str) -> AltarResult<()> {
        self.db
            .query("DELETE type::thing('super_admin', $username)")
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }
}
