//! Item repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/find/list/update/delete over the canonical `items` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `normalize_name()` before SQL mutations.
//! - Read and delete paths reject invalid persisted rows instead of masking
//!   them.
//! - The connection mutex is held for the whole of each call.

use crate::db::migrations::{schema_version, supported_version};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::item::{normalize_name, Item, ItemId, ItemValidationError};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Arc;

const ITEMS_TABLE: &str = "items";
const REQUIRED_ITEM_COLUMNS: &[&str] = &["id", "name"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Error surface shared by every item repository backend.
#[derive(Debug)]
pub enum RepoError {
    Validation(ItemValidationError),
    Db(DbError),
    NotFound(ItemId),
    InvalidData(String),
    SchemaVersionMismatch {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    IdSpaceExhausted,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted item data: {message}"),
            Self::SchemaVersionMismatch {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
            Self::IdSpaceExhausted => write!(f, "no item ids left to assign"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::InvalidData(_)
            | Self::SchemaVersionMismatch { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. }
            | Self::IdSpaceExhausted => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Keyed item table with store-assigned ids.
pub trait ItemRepository: Send + Sync {
    /// Assigns the next unused id and stores the item.
    fn insert_item(&self, name: &str) -> RepoResult<Item>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    /// Returns every item in insertion order.
    fn list_items(&self) -> RepoResult<Vec<Item>>;
    /// Replaces the name of an existing item. Validation runs before the
    /// existence check.
    fn update_item(&self, id: ItemId, name: &str) -> RepoResult<Item>;
    /// Removes an item and returns what was stored.
    fn delete_item(&self, id: ItemId) -> RepoResult<Item>;
    fn count_items(&self) -> RepoResult<u64>;
}

/// Shared, type-erased store handle passed into the HTTP layer.
pub type SharedItemRepository = Arc<dyn ItemRepository>;

impl<R: ItemRepository + ?Sized> ItemRepository for Arc<R> {
    fn insert_item(&self, name: &str) -> RepoResult<Item> {
        (**self).insert_item(name)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        (**self).get_item(id)
    }

    fn list_items(&self) -> RepoResult<Vec<Item>> {
        (**self).list_items()
    }

    fn update_item(&self, id: ItemId, name: &str) -> RepoResult<Item> {
        (**self).update_item(id, name)
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<Item> {
        (**self).delete_item(id)
    }

    fn count_items(&self) -> RepoResult<u64> {
        (**self).count_items()
    }
}

/// SQLite-backed item repository owning one migrated connection.
pub struct SqliteItemRepository {
    conn: Mutex<Connection>,
}

impl SqliteItemRepository {
    /// Wraps a migrated connection, rejecting one whose schema does not match.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::try_new(open_db(path)?)
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }
}

impl ItemRepository for SqliteItemRepository {
    fn insert_item(&self, name: &str) -> RepoResult<Item> {
        let name = normalize_name(name)?;

        let conn = self.conn.lock();
        let item = conn.query_row(
            "INSERT INTO items (name) VALUES (?1) RETURNING id, name;",
            [name.as_str()],
            read_item_row,
        )?;
        Ok(item)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let conn = self.conn.lock();
        let item = conn
            .query_row(
                "SELECT id, name FROM items WHERE id = ?1;",
                [id],
                read_item_row,
            )
            .optional()?;

        item.map(check_persisted_item).transpose()
    }

    fn list_items(&self) -> RepoResult<Vec<Item>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, name FROM items ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();

        while let Some(row) = rows.next()? {
            items.push(check_persisted_item(read_item_row(row)?)?);
        }

        Ok(items)
    }

    fn update_item(&self, id: ItemId, name: &str) -> RepoResult<Item> {
        let name = normalize_name(name)?;

        let conn = self.conn.lock();
        conn.query_row(
            "UPDATE items SET name = ?2 WHERE id = ?1 RETURNING id, name;",
            rusqlite::params![id, name.as_str()],
            read_item_row,
        )
        .optional()?
        .ok_or(RepoError::NotFound(id))
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<Item> {
        let mut conn = self.conn.lock();
        // An invalid stored row rolls the delete back with the error.
        let tx = conn.transaction()?;
        let item = tx
            .query_row(
                "DELETE FROM items WHERE id = ?1 RETURNING id, name;",
                [id],
                read_item_row,
            )
            .optional()?
            .ok_or(RepoError::NotFound(id))
            .and_then(check_persisted_item)?;
        tx.commit()?;
        Ok(item)
    }

    fn count_items(&self) -> RepoResult<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM items;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }
}

fn read_item_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get("id")?,
        name: row.get("name")?,
    })
}

fn check_persisted_item(item: Item) -> RepoResult<Item> {
    match normalize_name(&item.name) {
        Ok(normalized) if normalized == item.name => Ok(item),
        Ok(_) | Err(_) => Err(RepoError::InvalidData(format!(
            "invalid name value for id `{}` in items.name",
            item.id
        ))),
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = supported_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::SchemaVersionMismatch {
            expected_version,
            actual_version,
        });
    }

    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [ITEMS_TABLE],
        |row| row.get(0),
    )?;
    if !table_exists {
        return Err(RepoError::MissingRequiredTable(ITEMS_TABLE));
    }

    let mut stmt = conn.prepare("PRAGMA table_info(items);")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for &column in REQUIRED_ITEM_COLUMNS {
        if !columns.iter().any(|existing| existing == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: ITEMS_TABLE,
                column,
            });
        }
    }

    Ok(())
}
