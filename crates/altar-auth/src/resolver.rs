//! Login and refresh orchestration.

use std::sync::Arc;

use altar_core::error::{AltarError, AltarResult};
use altar_core::models::account::normalize_username;
use altar_core::models::identity::Identity;
use altar_core::repository::{LegacyAdminRepository, SuperAdminRepository, WeddingAdminRepository};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::provider::{
    IdentityProvider, LegacyAdminProvider, MasterProvider, ProviderOutcome, ResolvedIdentity,
    SuperAdminProvider, WeddingAdminProvider,
};
use crate::token::{Claims, TokenCodec, TokenType};

/// Successful login or refresh result.
#[derive(Debug, Clone)]
pub struct LoginOutput {
    /// Signed access token.
    pub access_token: String,
    /// Signed refresh token.
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub identity: Identity,
    pub wedding_ids: Vec<Uuid>,
    pub must_change_password: bool,
}

/// Resolves credentials against an ordered chain of identity providers.
///
/// The first provider that owns the username decides the outcome. Every
/// failure collapses into one generic 401 so the response never reveals
/// which namespace, if any, holds the name.
pub struct IdentityResolver {
    providers: Vec<Box<dyn IdentityProvider>>,
    codec: Arc<TokenCodec>,
}

impl IdentityResolver {
    /// An empty chain. Providers are consulted in insertion order.
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self {
            providers: Vec::new(),
            codec,
        }
    }

    pub fn with_provider(mut self, provider: impl IdentityProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// The production chain: master, super-admin, wedding admin, legacy.
    pub fn standard<S, W, L>(
        config: &AuthConfig,
        codec: Arc<TokenCodec>,
        super_admins: S,
        wedding_admins: W,
        legacy_admins: L,
    ) -> Self
    where
        S: SuperAdminRepository + 'static,
        W: WeddingAdminRepository + 'static,
        L: LegacyAdminRepository + 'static,
    {
        Self::new(codec)
            .with_provider(MasterProvider::new(config))
            .with_provider(SuperAdminProvider::new(super_admins, config))
            .with_provider(WeddingAdminProvider::new(wedding_admins, config))
            .with_provider(LegacyAdminProvider::new(legacy_admins, config))
    }

    /// Authenticate a username/password pair and issue a token pair.
    pub async fn login(&self, username: &str, password: &str) -> AltarResult<LoginOutput> {
        let username = normalize_username(username);
        if username.is_empty() || password.is_empty() {
            return Err(AltarError::validation("Username and password are required"));
        }

        for provider in &self.providers {
            match provider.try_authenticate(&username, password).await? {
                ProviderOutcome::NotFound => continue,
                ProviderOutcome::Rejected => {
                    warn!(
                        username = %username,
                        namespace = provider.namespace(),
                        "Login rejected: password mismatch"
                    );
                    return Err(AuthError::InvalidCredentials.into());
                }
                ProviderOutcome::Authenticated(resolved) => {
                    info!(
                        username = %username,
                        role = %resolved.identity.role,
                        "Login succeeded"
                    );
                    return self.issue(resolved);
                }
            }
        }

        warn!(username = %username, "Login rejected: unknown account");
        Err(AuthError::InvalidCredentials.into())
    }

    /// Rotate a refresh token into a fresh access/refresh pair.
    ///
    /// Stateless: the account is not looked up again, so a deleted
    /// account can keep refreshing until its refresh token expires.
    pub fn refresh(&self, refresh_token: &str) -> AltarResult<LoginOutput> {
        let claims = self.codec.verify(refresh_token, TokenType::Refresh)?;
        self.issue(ResolvedIdentity {
            identity: claims.identity(),
            wedding_ids: claims.wedding_ids.unwrap_or_default(),
            must_change_password: claims.must_change_password,
        })
    }

    fn issue(&self, resolved: ResolvedIdentity) -> AltarResult<LoginOutput> {
        let now = Utc::now().timestamp_millis();
        let claims_for = |token_type| Claims {
            subject: resolved.identity.subject.clone(),
            role: resolved.identity.role,
            issued_at: now,
            token_type,
            wedding_ids: (!resolved.identity.is_privileged()).then(|| resolved.wedding_ids.clone()),
            must_change_password: resolved.must_change_password,
        };

        let access_token = self.codec.sign(&claims_for(TokenType::Access))?;
        let refresh_token = self.codec.sign(&claims_for(TokenType::Refresh))?;

        Ok(LoginOutput {
            access_token,
            refresh_token,
            expires_in: TokenType::Access.ttl_secs(),
            identity: resolved.identity,
            wedding_ids: resolved.wedding_ids,
            must_change_password: resolved.must_change_password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use altar_core::models::identity::Role;

    fn resolver(master_password: &str) -> IdentityResolver {
        let config = AuthConfig {
            master_password: master_password.into(),
            ..Default::default()
        };
        let codec = Arc::new(TokenCodec::new("resolver-test-secret").unwrap());
        IdentityResolver::new(codec).with_provider(MasterProvider::new(&config))
    }

    #[tokio::test]
    async fn master_login_issues_master_tokens() {
        let out = resolver("sekrit").login("  MASTER ", "sekrit").await.unwrap();
        assert_eq!(out.identity, Identity::new("master", Role::Master));
        assert_eq!(out.expires_in, 900);
        assert!(out.wedding_ids.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_gets_generic_401() {
        let err = resolver("sekrit").login("nobody", "pw").await.unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_string(), "Authentication failed: Invalid username or password");
    }

    #[tokio::test]
    async fn blank_credentials_are_a_validation_error() {
        let err = resolver("sekrit").login("   ", "pw").await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        let err = resolver("sekrit").login("master", "").await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn refresh_rotates_for_same_subject() {
        let resolver = resolver("sekrit");
        let first = resolver.login("master", "sekrit").await.unwrap();
        let second = resolver.refresh(&first.refresh_token).unwrap();
        assert_eq!(second.identity, first.identity);
        assert_eq!(second.expires_in, 900);
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let resolver = resolver("sekrit");
        let out = resolver.login("master", "sekrit").await.unwrap();
        let err = resolver.refresh(&out.access_token).unwrap_err();
        assert_eq!(err.to_string(), "Authentication failed: Invalid token type");
    }
}
