//! Layered configuration for the shelf service.
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults.
//! 2. A configuration file: TOML, YAML or JSON, chosen by extension. Either
//!    the path given explicitly, or `config.toml` in the platform
//!    configuration directory when that file exists.
//! 3. Environment variables prefixed `SHELF_`, with `__` separating nested
//!    keys (`SHELF_SERVER__BIND=0.0.0.0:80`, `SHELF_CATALOG__PAGE_SIZE=10`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use shelf_catalog::{DEFAULT_MAX_CONNECTIONS, DEFAULT_PAGE_SIZE};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "SHELF_";
const DEFAULT_FILE_NAME: &str = "config.toml";
const DATABASE_FILE_NAME: &str = "catalog.db";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "shelf")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    pub bind: String,
    /// Worker threads; unset means one per CPU core.
    pub workers: Option<usize>,
}
impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1:8080".to_string(), workers: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file, or `:memory:` for a throwaway database.
    pub path: PathBuf,
    pub max_connections: u32,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_NAME));
        Self { path, max_connections: DEFAULT_MAX_CONNECTIONS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Books per page on the index.
    pub page_size: u32,
}
impl Default for CatalogConfig {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directives; `RUST_LOG` wins when set.
    pub filter: String,
    /// Emit one JSON object per event instead of human-readable lines.
    pub json: bool,
}
impl Default for LogConfig {
    fn default() -> Self {
        Self { filter: "info".to_string(), json: false }
    }
}

impl Config {
    /// The configuration file used when none is given explicitly.
    pub fn default_file() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(DEFAULT_FILE_NAME))
    }

    /// Load, merge and validate every source.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(file)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Build the layered figment without extracting it.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Config::default()));
        let figment = match file {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::FileNotFound(path.to_path_buf()));
                }
                Self::merge_file(figment, path)?
            },
            None => match Self::default_file() {
                Some(path) if path.is_file() => Self::merge_file(figment, &path)?,
                _ => figment,
            },
        };
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
        tracing::debug!(path = %path.display(), "reading configuration file");
        let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        Ok(match extension.as_deref() {
            Some("toml") => figment.merge(Toml::file(path)),
            Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
        })
    }

    /// Reject values that load fine but cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.server.bind.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid { field: "server.bind", reason: "must not be empty" });
        }
        if self.server.workers == Some(0) {
            exn::bail!(ErrorKind::Invalid { field: "server.workers", reason: "must be at least 1" });
        }
        if self.database.path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid { field: "database.path", reason: "must not be empty" });
        }
        if self.database.max_connections == 0 {
            exn::bail!(ErrorKind::Invalid { field: "database.max_connections", reason: "must be at least 1" });
        }
        if self.catalog.page_size == 0 {
            exn::bail!(ErrorKind::Invalid { field: "catalog.page_size", reason: "must be at least 1" });
        }
        Ok(())
    }
}
