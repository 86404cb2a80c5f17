//! Ordered schema steps for the item table.
//!
//! # Invariants
//! - Step versions start at 1 and increase by exactly one.
//! - All pending steps commit together or not at all.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, Transaction};

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Migration] = &[Migration {
    version: 1,
    name: "items",
    sql: include_str!("0001_items.sql"),
}];

/// Schema version written by the last known step.
pub fn supported_version() -> u32 {
    STEPS.len() as u32
}

/// Reads the schema version recorded in the database.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

fn pending(after: u32) -> impl Iterator<Item = &'static Migration> {
    STEPS.iter().filter(move |step| step.version > after)
}

fn run_step(tx: &Transaction<'_>, step: &Migration) -> DbResult<()> {
    let to_db_error = |source| DbError::Migration {
        version: step.version,
        name: step.name,
        source,
    };
    tx.execute_batch(step.sql).map_err(to_db_error)?;
    tx.pragma_update(None, "user_version", step.version)
        .map_err(to_db_error)?;
    info!(
        "event=db_migrate module=db status=ok version={} name={}",
        step.version, step.name
    );
    Ok(())
}

/// Brings `conn` up to `supported_version()`.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let supported = supported_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }
    if found == supported {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in pending(found) {
        run_step(&tx, step)?;
    }
    tx.commit()?;
    Ok(())
}
