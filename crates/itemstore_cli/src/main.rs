//! `itemstore` executable.
//!
//! # Responsibility
//! - Merge the config file with command-line and environment overrides.
//! - Initialize logging before the store is opened.
//! - Serve until the process is terminated.

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use itemstore_core::{init_logging, LogSettings};
use itemstore_server::{load_config, run, AppConfig, MutationResponse, StorageBackend};
use log::info;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StorageArg {
    Memory,
    Sqlite,
}

impl From<StorageArg> for StorageBackend {
    fn from(value: StorageArg) -> Self {
        match value {
            StorageArg::Memory => StorageBackend::Memory,
            StorageArg::Sqlite => StorageBackend::Sqlite,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "itemstore", version, about = "Single-entity CRUD service over HTTP")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, env = "ITEMSTORE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "ITEMSTORE_HOST")]
    host: Option<String>,

    /// `0` picks an ephemeral port.
    #[arg(long, env = "ITEMSTORE_PORT")]
    port: Option<u16>,

    #[arg(long, env = "ITEMSTORE_WORKERS")]
    workers: Option<usize>,

    #[arg(long, value_enum, env = "ITEMSTORE_STORAGE")]
    storage: Option<StorageArg>,

    /// SQLite database file.
    #[arg(long, env = "ITEMSTORE_DB")]
    db: Option<PathBuf>,

    /// Collection path segment, `items` by default.
    #[arg(long, env = "ITEMSTORE_RESOURCE")]
    resource: Option<String>,

    #[arg(long, env = "ITEMSTORE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rotating log files.
    #[arg(long, env = "ITEMSTORE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Answer successful updates and deletes with 204 instead of the record.
    /// The env var accepts 1/0, true/false, yes/no, on/off.
    #[arg(
        long,
        env = "ITEMSTORE_NO_CONTENT",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    no_content: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => AppConfig::default(),
        };
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(workers) = self.workers {
            config.server.workers = workers;
        }
        if let Some(storage) = self.storage {
            config.storage.backend = storage.into();
        }
        if let Some(db) = &self.db {
            config.storage.path = Some(db.clone());
        }
        if let Some(resource) = &self.resource {
            config.api.resource = resource.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(dir) = &self.log_dir {
            config.logging.dir = Some(dir.clone());
        }
        if self.no_content {
            config.api.mutation_response = MutationResponse::NoContent;
        }
    }
}

fn start_logging(config: &AppConfig) -> Result<()> {
    let settings = LogSettings::new(&config.logging.level, config.logging.dir.as_deref())?;
    init_logging(&settings).context("failed to initialize logging")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    start_logging(&config)?;

    let handle = run(&config).context("failed to start itemstore")?;
    info!(
        "event=app_start module=cli status=ok address={} resource={} backend={}",
        handle.local_addr(),
        config.api.resource,
        config.storage.backend.as_str()
    );
    handle.wait();
    Ok(())
}
