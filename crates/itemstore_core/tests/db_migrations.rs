use itemstore_core::db::migrations::{schema_version, supported_version};
use itemstore_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

fn items_table_count(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'items';",
        [],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn fresh_database_reaches_supported_version() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), supported_version());
    assert_eq!(items_table_count(&conn), 1);
}

#[test]
fn reopening_keeps_rows_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("items.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        conn.execute("INSERT INTO items (name) VALUES ('kept');", [])
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), supported_version());
    let names: Vec<String> = conn
        .prepare("SELECT name FROM items;")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names, vec!["kept".to_string()]);
}

#[test]
fn database_from_a_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    Connection::open(&path)
        .unwrap()
        .pragma_update(None, "user_version", 999)
        .unwrap();

    match open_db(&path) {
        Err(DbError::SchemaTooNew { found, supported }) => {
            assert_eq!(found, 999);
            assert_eq!(supported, supported_version());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("newer schema must be refused"),
    }
}

#[test]
fn schema_rejects_empty_names() {
    let conn = open_db_in_memory().unwrap();

    assert!(conn.execute("INSERT INTO items (name) VALUES ('');", []).is_err());
}

#[test]
fn deleted_ids_are_not_reassigned_by_the_schema() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO items (name) VALUES ('a');
         INSERT INTO items (name) VALUES ('b');
         DELETE FROM items WHERE id = 2;
         INSERT INTO items (name) VALUES ('c');",
    )
    .unwrap();

    let last: i64 = conn
        .query_row("SELECT MAX(id) FROM items;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(last, 3);
}
