use petstore_core::db::migrations::latest_version;
use petstore_core::db::{ensure_catalog_ready, open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_creates_catalog_tables() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kind");
    assert_table_exists(&conn, "pet");
    ensure_catalog_ready(&conn).unwrap();
}

#[test]
fn reopening_a_file_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pets.db");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO kind (name, food, sound) VALUES ('dog', 'dogfood', 'bark');",
        [],
    )
    .unwrap();
    drop(conn);

    let reopened = open_db(&path).unwrap();
    assert_eq!(schema_version(&reopened), latest_version());
    let kinds: i64 = reopened
        .query_row("SELECT COUNT(*) FROM kind;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(kinds, 1);
}

#[test]
fn pet_foreign_key_restricts_kind_delete() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO kind (id, name) VALUES (1, 'dog');
         INSERT INTO pet (name, kind_id) VALUES ('Dorothy', 1);",
    )
    .unwrap();

    let err = conn.execute("DELETE FROM kind WHERE id = 1;", []).unwrap_err();
    assert_eq!(
        err.sqlite_error().map(|code| code.extended_code),
        Some(rusqlite::ffi::SQLITE_CONSTRAINT_TRIGGER)
    );
    assert!(err.to_string().contains("FOREIGN KEY constraint failed"));

    let orphan = conn
        .execute("INSERT INTO pet (name, kind_id) VALUES ('Rex', 7);", [])
        .unwrap_err();
    assert_eq!(
        orphan.sqlite_error().map(|code| code.extended_code),
        Some(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
    );
}

#[test]
fn blank_names_are_rejected_by_schema() {
    let conn = open_db_in_memory().unwrap();
    assert!(conn
        .execute("INSERT INTO kind (name) VALUES ('');", [])
        .is_err());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unmigrated_connection_is_not_catalog_ready() {
    let conn = Connection::open_in_memory().unwrap();

    match ensure_catalog_ready(&conn).unwrap_err() {
        DbError::UninitializedConnection {
            expected_version,
            actual_version,
        } => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn catalog_requires_foreign_keys_on() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();

    assert!(matches!(
        ensure_catalog_ready(&conn),
        Err(DbError::ForeignKeysDisabled)
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
