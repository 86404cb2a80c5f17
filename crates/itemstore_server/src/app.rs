//! Startup wiring: store, seed data, handler, server.
//!
//! # Responsibility
//! - Construct the store handle from configuration and pass it down
//!   explicitly.
//! - Apply seed data once, then start serving.

use crate::api::ItemApi;
use crate::config::{AppConfig, StorageBackend, StorageConfig};
use crate::server::{start_server, ServerError, ServerHandle};
use itemstore_core::{
    InMemoryItemRepository, ItemService, RepoError, SharedItemRepository, SqliteItemRepository,
};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug)]
pub enum AppError {
    Store(RepoError),
    Server(ServerError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "store error: {err}"),
            Self::Server(err) => write!(f, "server error: {err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Server(err) => Some(err),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

impl From<ServerError> for AppError {
    fn from(value: ServerError) -> Self {
        Self::Server(value)
    }
}

/// Opens the configured backend. SQLite databases are migrated here, once.
pub fn open_repository(storage: &StorageConfig) -> Result<SharedItemRepository, RepoError> {
    let repo: SharedItemRepository = match (storage.backend, storage.path.as_deref()) {
        (StorageBackend::Memory, _) => Arc::new(InMemoryItemRepository::new()),
        (StorageBackend::Sqlite, Some(path)) => Arc::new(SqliteItemRepository::open(path)?),
        (StorageBackend::Sqlite, None) => Arc::new(SqliteItemRepository::open_in_memory()?),
    };
    info!(
        "event=store_open module=app status=ok backend={}",
        storage.backend.as_str()
    );
    Ok(repo)
}

/// Builds the handler for `config`, seeding the store when it is empty.
pub fn build_api(config: &AppConfig) -> Result<ItemApi<SharedItemRepository>, AppError> {
    let service = ItemService::new(open_repository(&config.storage)?);
    service.seed_if_empty(config.seed.as_slice())?;
    Ok(ItemApi::new(service, config.api.settings()))
}

/// Builds the handler and starts serving it.
pub fn run(config: &AppConfig) -> Result<ServerHandle, AppError> {
    let api = build_api(config)?;
    Ok(start_server(&config.server, api)?)
}
