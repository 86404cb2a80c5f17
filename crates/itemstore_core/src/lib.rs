//! Core domain logic for the item store.
//! This crate is the single source of truth for item invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{
    active_logging, default_log_level, init_logging, LogSettings, LogTarget, LoggingError,
};
pub use model::item::{
    normalize_name, Item, ItemDraft, ItemId, ItemValidationError, NAME_MAX_CHARS,
};
pub use repo::item_repo::{
    ItemRepository, RepoError, RepoResult, SharedItemRepository, SqliteItemRepository,
};
pub use repo::memory_repo::InMemoryItemRepository;
pub use service::item_service::ItemService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
