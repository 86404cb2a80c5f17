//! Connection factory for the item database.
//!
//! # Invariants
//! - A connection leaves this module only after `apply_migrations` succeeded.

use super::migrations::{apply_migrations, schema_version};
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// How long a writer waits on a locked database file before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) the database file at `path`.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    prepare("file", || Connection::open(path))
}

/// Opens a private in-memory database. Each call gets a fresh one.
pub fn open_db_in_memory() -> DbResult<Connection> {
    prepare("memory", Connection::open_in_memory)
}

fn prepare(
    mode: &'static str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started = Instant::now();
    let outcome: DbResult<Connection> = connect()
        .map_err(DbError::from)
        .and_then(|mut conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            apply_migrations(&mut conn)?;
            Ok(conn)
        });
    let elapsed_ms = started.elapsed().as_millis();

    match &outcome {
        Ok(conn) => info!(
            "event=db_open module=db status=ok mode={mode} schema_version={} duration_ms={elapsed_ms}",
            schema_version(conn).unwrap_or_default()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={elapsed_ms} error={err}"
        ),
    }
    outcome
}
