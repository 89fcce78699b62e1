//! Application configuration
//!
//! Layered: defaults, then an optional JSON config file, then CLI flags
//! (which already absorb environment variables via clap's `env` attribute).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cli::CliConfig;
use super::constants::{CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_PORT, SQLITE_DB_FILENAME};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub server: ServerFileConfig,
    pub database: DatabaseFileConfig,
    pub auth: AuthFileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseFileConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthFileConfig {
    pub api_key: Option<String>,
}

impl FileConfig {
    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }
}

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Static bearer key; None disables auth (local development)
    pub api_key: Option<String>,
}

impl AppConfig {
    /// Load configuration: defaults <- config file <- env/CLI
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load_from_file(path)?,
            None => {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                if local.exists() {
                    FileConfig::load_from_file(&local)?
                } else {
                    FileConfig::default()
                }
            }
        };

        let config = Self {
            server: ServerConfig {
                host: cli
                    .host
                    .clone()
                    .or(file.server.host)
                    .unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: cli.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
            },
            database: DatabaseConfig {
                path: cli
                    .db_path
                    .clone()
                    .or(file.database.path)
                    .unwrap_or_else(|| PathBuf::from(SQLITE_DB_FILENAME)),
            },
            auth: AuthConfig {
                api_key: cli.api_key.clone().or(file.auth.api_key),
            },
        };

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            db = %config.database.path.display(),
            auth = config.auth.api_key.is_some(),
            "Configuration loaded"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn empty_cli() -> CliConfig {
        CliConfig {
            host: None,
            port: None,
            config: None,
            db_path: None,
            api_key: None,
        }
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::load(&empty_cli()).unwrap();
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert!(config.auth.api_key.is_none());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "server": {{ "host": "0.0.0.0", "port": 9000 }}, "auth": {{ "api_key": "k1" }} }}"#
        )
        .unwrap();

        let mut cli = empty_cli();
        cli.config = Some(file.path().to_path_buf());
        cli.port = Some(9100);

        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.auth.api_key.as_deref(), Some("k1"));
    }

    #[test]
    fn test_invalid_config_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let mut cli = empty_cli();
        cli.config = Some(file.path().to_path_buf());
        assert!(AppConfig::load(&cli).is_err());
    }
}
