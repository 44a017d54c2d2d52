//! Server configuration.
//!
//! Sources are merged in this order, later ones overriding earlier ones:
//! 1. Defaults from [`ServerConfig::default()`]
//! 2. TOML file (`altar.toml`, or the path in `ALTAR_CONFIG`), if present
//! 3. Environment variables prefixed `ALTAR_`, with `__` separating
//!    nested keys (e.g. `ALTAR_AUTH__TOKEN_SECRET`, `ALTAR_DB__URL`)

use std::path::{Path, PathBuf};

use altar_auth::AuthConfig;
use altar_db::DbConfig;
use anyhow::{Context, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "altar.toml";
pub const CONFIG_PATH_VAR: &str = "ALTAR_CONFIG";
const ENV_PREFIX: &str = "ALTAR_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub auth: AuthConfig,
    pub db: DbConfig,
}

impl ServerConfig {
    /// Load from the default sources and validate.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::from_figment(Self::figment(&path))
    }

    /// Provider stack without extraction, so callers and tests can merge
    /// extra sources on top.
    pub fn figment(path: &Path) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if path.exists() {
            info!(path = %path.display(), "Loading configuration file");
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config: Self = figment
            .extract()
            .context("Failed to extract configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Refuse to start without signing material or a master password.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth.token_secret.trim().is_empty() {
            bail!("auth.token_secret must be set");
        }
        if self.auth.master_password.is_empty() {
            bail!("auth.master_password must be set");
        }
        if self.db.url.trim().is_empty() {
            bail!("db.url must be set");
        }
        Ok(())
    }
}
