//! Runtime configuration: TOML file plus environment overrides.
//!
//! ```toml
//! [store]
//! database_url = "prices.db"
//!
//! [ingest]
//! default_archive = "zip"   # or "tar"
//! ```
//!
//! Both sections are optional. `DATABASE_URL` in the environment always wins over
//! `store.database_url`.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shared_utils::ConfigError;
use shared_utils::env::env_var_opt;

use crate::archive::ArchiveKind;

/// Environment variable that overrides `store.database_url`.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Top-level configuration file.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Persisted store settings.
    #[serde(default)]
    pub store: StoreCfg,
    /// Ingestion defaults.
    #[serde(default)]
    pub ingest: IngestCfg,
}

/// `[store]` section.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreCfg {
    /// SQLite path or `sqlite:` URL.
    pub database_url: Option<String>,
}

/// `[ingest]` section.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IngestCfg {
    /// Archive kind assumed when a request carries no tag.
    #[serde(default)]
    pub default_archive: ArchiveKind,
}

impl Config {
    /// Resolve the database location: environment first, then the config file.
    pub fn database_url(&self) -> Result<String, ConfigError> {
        self.database_url_with(env_var_opt(DATABASE_URL_ENV))
    }

    fn database_url_with(&self, from_env: Option<String>) -> Result<String, ConfigError> {
        let url = from_env
            .or_else(|| {
                self.store
                    .database_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
            .ok_or_else(|| ConfigError::MissingEnvVar(DATABASE_URL_ENV.to_string()))?;

        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Err(ConfigError::InvalidValue {
                name: DATABASE_URL_ENV.to_string(),
                reason: "the price store is SQLite only".to_string(),
            });
        }
        Ok(url)
    }
}

/// Parse a configuration from a TOML string.
pub fn load_config_str(s: &str) -> anyhow::Result<Config> {
    toml::from_str(s).context("invalid price_sync config")
}

/// Read and parse a configuration file.
pub fn load_config_path(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    load_config_str(&s)
}
