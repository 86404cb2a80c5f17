//! Item use-case service.
//!
//! # Responsibility
//! - Provide the CRUD entry points used by the HTTP handler and startup seeding.
//! - Turn absent rows into `RepoError::NotFound`.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - The service holds no item state of its own.

use crate::model::item::{normalize_name, Item, ItemId};
use crate::repo::item_repo::{ItemRepository, RepoError, RepoResult};
use log::{debug, info, warn};

/// Use-case service wrapper for item CRUD operations.
pub struct ItemService<R: ItemRepository> {
    repo: R,
}

impl<R: ItemRepository> ItemService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an item; the store assigns its id.
    pub fn create_item(&self, name: &str) -> RepoResult<Item> {
        let result = self.repo.insert_item(name);
        match &result {
            Ok(item) => info!(
                "event=item_create module=service status=ok item_id={}",
                item.id
            ),
            Err(err) => log_failure("item_create", None, err),
        }
        result
    }

    /// Gets one item, reporting `NotFound` when the id is unknown.
    pub fn get_item(&self, id: ItemId) -> RepoResult<Item> {
        let result = self
            .repo
            .get_item(id)
            .and_then(|item| item.ok_or(RepoError::NotFound(id)));
        match &result {
            Ok(_) => debug!("event=item_get module=service status=ok item_id={id}"),
            Err(err) => log_failure("item_get", Some(id), err),
        }
        result
    }

    pub fn list_items(&self) -> RepoResult<Vec<Item>> {
        let result = self.repo.list_items();
        match &result {
            Ok(items) => debug!(
                "event=item_list module=service status=ok count={}",
                items.len()
            ),
            Err(err) => log_failure("item_list", None, err),
        }
        result
    }

    /// Replaces the name of an existing item.
    pub fn update_item(&self, id: ItemId, name: &str) -> RepoResult<Item> {
        let result = self.repo.update_item(id, name);
        match &result {
            Ok(_) => info!("event=item_update module=service status=ok item_id={id}"),
            Err(err) => log_failure("item_update", Some(id), err),
        }
        result
    }

    /// Deletes an item and returns the removed record.
    pub fn delete_item(&self, id: ItemId) -> RepoResult<Item> {
        let result = self.repo.delete_item(id);
        match &result {
            Ok(_) => info!("event=item_delete module=service status=ok item_id={id}"),
            Err(err) => log_failure("item_delete", Some(id), err),
        }
        result
    }

    pub fn count_items(&self) -> RepoResult<u64> {
        self.repo.count_items()
    }

    /// Inserts `names` only when the store is empty.
    ///
    /// Returns the number of items inserted. Every name is validated before
    /// the first insert.
    pub fn seed_if_empty<S: AsRef<str>>(&self, names: &[S]) -> RepoResult<usize> {
        if names.is_empty() {
            return Ok(0);
        }

        let existing = self.repo.count_items()?;
        if existing > 0 {
            info!(
                "event=item_seed module=service status=skipped existing={existing}"
            );
            return Ok(0);
        }

        for name in names {
            normalize_name(name.as_ref())?;
        }
        for name in names {
            self.repo.insert_item(name.as_ref())?;
        }
        info!(
            "event=item_seed module=service status=ok inserted={}",
            names.len()
        );
        Ok(names.len())
    }
}

fn log_failure(event: &str, id: Option<ItemId>, err: &RepoError) {
    let id = id.map_or_else(|| "-".to_string(), |id| id.to_string());
    match err {
        RepoError::Validation(_) | RepoError::NotFound(_) => debug!(
            "event={event} module=service status=rejected item_id={id} error={err}"
        ),
        _ => warn!("event={event} module=service status=error item_id={id} error={err}"),
    }
}
