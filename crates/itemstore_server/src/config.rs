//! Service configuration file.
//!
//! # Responsibility
//! - Parse the TOML configuration, filling every missing key with a default.
//! - Validate values that would otherwise fail late, after the store is open.
//!
//! # Invariants
//! - A validated config always names a store path for the sqlite backend.
//! - `api.resource` is a single lowercase path segment.

use crate::api::{ApiSettings, MutationResponse};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

static RESOURCE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_-]*$").expect("valid resource name regex"));

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    /// Names inserted at startup when the store is empty.
    pub seed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    /// `0` binds an ephemeral port.
    pub port: u16,
    pub workers: usize,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: 4,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub resource: String,
    pub mutation_response: MutationResponse,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let settings = ApiSettings::default();
        Self {
            resource: settings.resource,
            mutation_response: settings.mutation_response,
        }
    }
}

impl ApiConfig {
    pub fn settings(&self) -> ApiSettings {
        ApiSettings {
            resource: self.resource.clone(),
            mutation_response: self.mutation_response,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

impl StorageBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database file, required for `sqlite`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files; stderr when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: itemstore_core::default_log_level().to_string(),
            dir: None,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(source: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.workers == 0 {
            return Err(ConfigError::Invalid(
                "server.workers must be at least 1".to_string(),
            ));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be at least 1".to_string(),
            ));
        }
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "server.host must not be empty".to_string(),
            ));
        }
        if !RESOURCE_NAME_RE.is_match(&self.api.resource) {
            return Err(ConfigError::Invalid(format!(
                "api.resource `{}` must match {}",
                self.api.resource,
                RESOURCE_NAME_RE.as_str()
            )));
        }
        if self.storage.backend == StorageBackend::Sqlite && self.storage.path.is_none() {
            return Err(ConfigError::Invalid(
                "storage.path is required for the sqlite backend".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reads and parses a config file. Callers validate after applying their
/// own overrides.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    AppConfig::from_toml_str(&source, path)
}

#[cfg(test)]
mod tests {
    use super::{load_config, AppConfig, ConfigError, StorageBackend};
    use crate::api::MutationResponse;
    use std::path::{Path, PathBuf};

    fn parse(source: &str) -> Result<AppConfig, ConfigError> {
        AppConfig::from_toml_str(source, Path::new("test.toml"))
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.address(), "127.0.0.1:8080");
        assert_eq!(config.api.resource, "items");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        config.validate().unwrap();
    }

    #[test]
    fn full_file_is_parsed() {
        let config = parse(
            r#"
            seed = ["Alice", "Bob"]

            [server]
            host = "0.0.0.0"
            port = 9000
            workers = 2
            max_body_bytes = 1024

            [api]
            resource = "books"
            mutation_response = "no_content"

            [storage]
            backend = "sqlite"
            path = "books.sqlite3"

            [logging]
            level = "warn"
            dir = "/var/log/itemstore"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.address(), "0.0.0.0:9000");
        assert_eq!(config.server.workers, 2);
        assert_eq!(config.api.resource, "books");
        assert_eq!(config.api.mutation_response, MutationResponse::NoContent);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.path, Some(PathBuf::from("books.sqlite3")));
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.seed, vec!["Alice".to_string(), "Bob".to_string()]);
        config.validate().unwrap();
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse("[server]\nthreads = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn sqlite_without_path_is_invalid() {
        let config = parse("[storage]\nbackend = \"sqlite\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("storage.path"));
    }

    #[test]
    fn resource_must_be_a_single_lowercase_segment() {
        for bad in ["", "Items", "items/extra", "1items"] {
            let mut config = AppConfig::default();
            config.api.resource = bad.to_string();
            assert!(config.validate().is_err(), "`{bad}` should be rejected");
        }
    }

    #[test]
    fn zero_workers_is_invalid() {
        let mut config = AppConfig::default();
        config.server.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
