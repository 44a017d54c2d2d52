//! SurrealDB implementation of [`LegacyAdminRepository`].

use altar_core::error::AltarResult;
use altar_core::models::account::{CreateLegacyAdmin, LegacyAdmin, validated_username};
use altar_core::repository::LegacyAdminRepository;
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::{DbError, check_write};
use crate::password::hash_password;

#[derive(Debug, Deserialize)]
struct LegacyAdminRow {
    username: String,
    password_hash: String,
    must_change_password: bool,
}

impl From<LegacyAdminRow> for LegacyAdmin {
    fn from(row: LegacyAdminRow) -> Self {
        Self {
            username: row.username,
            password_hash: row.password_hash,
            must_change_password: row.must_change_password,
        }
    }
}

#[derive(Clone)]
pub struct SurrealLegacyAdminRepository<C: Connection> {
    db: Surreal<C>,
    pepper: Option<String>,
}

impl<C: Connection> SurrealLegacyAdminRepository<C> {
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

impl<C: Connection> LegacyAdminRepository for SurrealLegacyAdminRepository<C> {
    async fn create(&self, input: CreateLegacyAdmin) -> AltarResult<LegacyAdmin> {
        let username = validated_username(&input.username)?;
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        let response = self
            .db
            .query(
                "CREATE type::thing('legacy_admin', $username) SET \
                 username = $username, password_hash = $password_hash, \
                 must_change_password = $must_change_password RETURN NONE",
            )
            .bind(("username", username.clone()))
            .bind(("password_hash", password_hash.clone()))
            .bind(("must_change_password", input.must_change_password))
            .await
            .map_err(DbError::from)?;
        check_write(response, "legacy admin")?;

        info!(username = %username, "Legacy admin created");

        Ok(LegacyAdmin {
            username,
            password_hash,
            must_change_password: input.must_change_password,
        })
    }

    async fn get_by_username(&self, username: &str) -> AltarResult<LegacyAdmin> {
        let mut result = self
            .db
            .query(
                "SELECT username, password_hash, must_change_password \
                 FROM type::thing('legacy_admin', $username)",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LegacyAdminRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(LegacyAdmin::from)
            .ok_or_else(|| {
                DbError::NotFound {
                    entity: "legacy admin".into(),
                    id: username.to_string(),
                }
                .into()
            })
    }
}
