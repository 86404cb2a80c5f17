//! In-memory item repository.
//!
//! # Responsibility
//! - Provide a process-local table for deployments that need no persistence.
//!
//! # Invariants
//! - `next_id` only grows, so deleted ids are never handed out again.
//! - Rows are keyed by id in a `BTreeMap`; ascending id is insertion order.

use crate::model::item::{normalize_name, Item, ItemId};
use crate::repo::item_repo::{ItemRepository, RepoError, RepoResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug)]
struct MemoryTable {
    next_id: ItemId,
    rows: BTreeMap<ItemId, String>,
}

impl Default for MemoryTable {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

/// Item table held behind a single mutex.
#[derive(Debug, Default)]
pub struct InMemoryItemRepository {
    table: Mutex<MemoryTable>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItemRepository for InMemoryItemRepository {
    fn insert_item(&self, name: &str) -> RepoResult<Item> {
        let name = normalize_name(name)?;

        let mut table = self.table.lock();
        let id = table.next_id;
        table.next_id = id.checked_add(1).ok_or(RepoError::IdSpaceExhausted)?;
        table.rows.insert(id, name.clone());
        Ok(Item::new(id, name))
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let table = self.table.lock();
        Ok(table.rows.get(&id).map(|name| Item::new(id, name.clone())))
    }

    fn list_items(&self) -> RepoResult<Vec<Item>> {
        let table = self.table.lock();
        Ok(table
            .rows
            .iter()
            .map(|(id, name)| Item::new(*id, name.clone()))
            .collect())
    }

    fn update_item(&self, id: ItemId, name: &str) -> RepoResult<Item> {
        let name = normalize_name(name)?;

        let mut table = self.table.lock();
        let slot = table.rows.get_mut(&id).ok_or(RepoError::NotFound(id))?;
        slot.clone_from(&name);
        Ok(Item::new(id, name))
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<Item> {
        let mut table = self.table.lock();
        table
            .rows
            .remove(&id)
            .map(|name| Item::new(id, name))
            .ok_or(RepoError::NotFound(id))
    }

    fn count_items(&self) -> RepoResult<u64> {
        let table = self.table.lock();
        Ok(table.rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryItemRepository;
    use crate::repo::item_repo::{ItemRepository, RepoError};

    #[test]
    fn exhausted_id_space_is_reported_instead_of_wrapping() {
        let repo = InMemoryItemRepository::new();
        repo.table.lock().next_id = i64::MAX;

        let err = repo.insert_item("last").unwrap_err();
        assert!(matches!(err, RepoError::IdSpaceExhausted));
        assert_eq!(repo.count_items().unwrap(), 0);
    }
}
