//! Session with the SurrealDB server holding account and wedding records.

use std::fmt;

use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;

/// Where Altar's records live and how to sign in.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// WebSocket address (e.g., `127.0.0.1:8000`).
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root credentials.
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "altar".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.url)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl DbConfig {
    fn root(&self) -> Root<'_> {
        Root {
            username: &self.username,
            password: &self.password,
        }
    }
}

/// An authenticated session scoped to the configured namespace and database.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Opening SurrealDB session"
        );

        let db = Surreal::new::<Ws>(config.url.as_str())
            .await
            .map_err(|e| DbError::Connect(format!("{}: {e}", config.url)))?;
        db.signin(config.root())
            .await
            .map_err(|e| DbError::Connect(format!("root sign-in rejected: {e}")))?;
        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await?;

        info!("SurrealDB session ready");
        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_root_password() {
        let config = DbConfig {
            password: "hunter2-root".into(),
            ..DbConfig::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2-root"));
        assert!(printed.contains("namespace: \"altar\""));
    }
}
