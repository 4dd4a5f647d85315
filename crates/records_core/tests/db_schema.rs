use records_core::db::migrations::{current_user_version, latest_version, upgrade};
use records_core::db::{open_db, open_db_in_memory, DbError};
use records_core::{
    AddressMatcher, ChangeNotifier, SqliteRecordStore, StoreError, DEFAULT_AUTHORITY,
};
use rusqlite::Connection;
use std::sync::Arc;

fn matcher() -> AddressMatcher {
    AddressMatcher::for_records(DEFAULT_AUTHORITY).unwrap()
}

fn column_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn.prepare("PRAGMA table_info(records);").unwrap();
    stmt.query_map([], |row| row.get::<_, String>("name"))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn open_db_in_memory_creates_records_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    assert_eq!(
        column_names(&conn),
        vec![
            "_id",
            "album_name",
            "band_name",
            "quantity",
            "price",
            "cover",
            "supplier_name",
            "supplier_email",
        ]
    );
}

#[test]
fn reopening_file_database_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.db");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO records (album_name, band_name, supplier_name, supplier_email) VALUES ('Low', 'David Bowie', 'RCA', 'rca@example.com');",
        [],
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    let (count, quantity, price): (i64, i64, i64) = conn
        .query_row("SELECT COUNT(*), quantity, price FROM records;", [], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .unwrap();
    assert_eq!((count, quantity, price), (1, 0, 0));
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 7;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 7);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn upgrade_at_current_version_is_a_noop() {
    let mut conn = open_db_in_memory().unwrap();
    upgrade(&mut conn, 1, 1).unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), 1);

    assert!(matches!(
        upgrade(&mut conn, 1, 0),
        Err(DbError::InvalidUpgrade {
            from_version: 1,
            to_version: 0
        })
    ));
}

#[test]
fn store_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteRecordStore::try_new(conn, matcher(), Arc::new(ChangeNotifier::new()))
        .err()
        .unwrap();

    assert!(matches!(
        err,
        StoreError::UninitializedConnection {
            expected_version: 1,
            actual_version: 0
        }
    ));
}

#[test]
fn store_rejects_connection_missing_records_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA user_version = 1;").unwrap();

    let err = SqliteRecordStore::try_new(conn, matcher(), Arc::new(ChangeNotifier::new()))
        .err()
        .unwrap();
    assert!(matches!(err, StoreError::MissingRequiredTable("records")));
}

#[test]
fn store_rejects_connection_missing_a_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE records (
            _id INTEGER PRIMARY KEY AUTOINCREMENT,
            album_name TEXT NOT NULL,
            band_name TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 0,
            price INTEGER NOT NULL DEFAULT 0,
            cover TEXT,
            supplier_name TEXT NOT NULL
        );
        PRAGMA user_version = 1;",
    )
    .unwrap();

    let err = SqliteRecordStore::try_new(conn, matcher(), Arc::new(ChangeNotifier::new()))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        StoreError::MissingRequiredColumn {
            table: "records",
            column: "supplier_email"
        }
    ));
}

#[test]
fn store_accepts_connection_from_open_db() {
    let conn = open_db_in_memory().unwrap();
    SqliteRecordStore::try_new(conn, matcher(), Arc::new(ChangeNotifier::new())).unwrap();
}
