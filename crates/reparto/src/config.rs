// File: src/config.rs
// Purpose: Configuration parsing from reparto.toml

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::store::CommitPolicy;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "REPARTO_CONFIG";

/// Config file read when `REPARTO_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "reparto.toml";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

/// Backing store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Directory holding the database file, created on first use
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Base file name; dots are stripped and `.db` appended
    #[serde(default = "default_db_name")]
    pub name: String,

    /// Table-creation statements run once, when the file does not exist yet
    #[serde(default = "default_schema")]
    pub schema: Vec<String>,

    /// What happens to a unit of work when its statement fails
    #[serde(default)]
    pub commit_policy: CommitPolicy,

    /// Tables the DAO may touch; empty means any valid identifier
    #[serde(default)]
    pub allowed_tables: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info", "reparto=debug")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to this file instead of stdout
    #[serde(default)]
    pub file: Option<PathBuf>,
}

// Default values
fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("/opt/reparto_material")
}

fn default_db_name() -> String {
    "database.db".to_string()
}

/// Example table used by the bundled item routes
pub fn default_schema() -> Vec<String> {
    vec![r#"
        CREATE TABLE items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR(200) NOT NULL,
            scanned_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )"#
    .to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            name: default_db_name(),
            schema: default_schema(),
            commit_policy: CommitPolicy::default(),
            allowed_tables: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// A missing or empty file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;

        Ok(config)
    }

    /// Load from `$REPARTO_CONFIG`, falling back to `./reparto.toml`
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    /// Checks values serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be between 1 and 65535");
        }
        if self.database.name.trim_matches(|c| c == '.' || c == '/' || c == '\\').is_empty() {
            bail!("database.name must contain more than dots and separators");
        }
        Ok(())
    }
}
