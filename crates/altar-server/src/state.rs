//! Assembly of the auth core over a database connection.

use std::sync::Arc;

use altar_auth::{
    AccountMembershipLookup, AuthConfig, IdentityResolver, SessionAuthenticator, TokenCodec,
    WeddingAccessPolicy, WeddingDirectory,
};
use altar_db::repository::{
    SurrealLegacyAdminRepository, SurrealSuperAdminRepository, SurrealWeddingAdminRepository,
    SurrealWeddingRepository,
};
use anyhow::Context;
use surrealdb::{Connection, Surreal};

pub type Membership<C> =
    AccountMembershipLookup<SurrealWeddingAdminRepository<C>, SurrealLegacyAdminRepository<C>>;
pub type Directory<C> = WeddingDirectory<SurrealWeddingRepository<C>, SurrealWeddingAdminRepository<C>>;
pub type AccessPolicy<C> =
    WeddingAccessPolicy<Membership<C>, SurrealWeddingRepository<C>, SurrealWeddingAdminRepository<C>>;

/// Shared services handed to request handlers.
pub struct AppState<C: Connection> {
    pub resolver: Arc<IdentityResolver>,
    pub sessions: Arc<SessionAuthenticator<Membership<C>>>,
    pub directory: Arc<Directory<C>>,
    pub policy: Arc<AccessPolicy<C>>,
}

impl<C: Connection + Clone> AppState<C> {
    pub fn build(config: &AuthConfig, db: &Surreal<C>) -> anyhow::Result<Self> {
        let codec = Arc::new(
            TokenCodec::new(&config.token_secret).context("Invalid token signing secret")?,
        );

        let (super_admins, wedding_admins, legacy_admins) = match &config.pepper {
            Some(pepper) => (
                SurrealSuperAdminRepository::with_pepper(db.clone(), pepper.clone()),
                SurrealWeddingAdminRepository::with_pepper(db.clone(), pepper.clone()),
                SurrealLegacyAdminRepository::with_pepper(db.clone(), pepper.clone()),
            ),
            None => (
                SurrealSuperAdminRepository::new(db.clone()),
                SurrealWeddingAdminRepository::new(db.clone()),
                SurrealLegacyAdminRepository::new(db.clone()),
            ),
        };

        let resolver = Arc::new(IdentityResolver::standard(
            config,
            codec.clone(),
            super_admins,
            wedding_admins.clone(),
            legacy_admins.clone(),
        ));
        let sessions = Arc::new(SessionAuthenticator::new(
            codec,
            AccountMembershipLookup::new(
                wedding_admins.clone(),
                legacy_admins,
                config.legacy_wedding_id,
            ),
        ));
        let directory = Arc::new(WeddingDirectory::new(
            SurrealWeddingRepository::new(db.clone()),
            wedding_admins,
        ));
        let policy = Arc::new(WeddingAccessPolicy::new(
            sessions.clone(),
            directory.clone(),
        ));

        Ok(Self {
            resolver,
            sessions,
            directory,
            policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use altar_core::models::identity::Role;
    use surrealdb::engine::local::Mem;

    fn config() -> AuthConfig {
        AuthConfig {
            token_secret: "state-test-secret".into(),
            master_password: "letmein".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn wired_state_authenticates_master() {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        altar_db::run_migrations(&db).await.unwrap();

        let state = AppState::build(&config(), &db).unwrap();
        let out = state.resolver.login("master", "letmein").await.unwrap();

        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            format!("Bearer {}", out.access_token).parse().unwrap(),
        );
        let identity = state.sessions.require_master(&headers).unwrap();
        assert_eq!(identity.role, Role::Master);
    }

    #[test]
    fn empty_secret_is_rejected() {
        let config = AuthConfig {
            token_secret: String::new(),
            ..config()
        };
        let db = Surreal::<surrealdb::engine::local::Db>::init();
        assert!(AppState::build(&config, &db).is_err());
    }
}
