//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - A failing migration rolls back completely; `user_version` is untouched.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

// Future schema versions append here; each must preserve existing rows.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    latest_in(MIGRATIONS)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    upgrade(conn, current_version, latest_version())
}

/// Migrates the schema forward from `old_version` to `new_version`.
///
/// At schema version 1 this is a no-op for every already-created database.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when `old_version` is newer than this binary.
/// - `InvalidUpgrade` when `new_version < old_version` or is unknown.
pub fn upgrade(conn: &mut Connection, old_version: u32, new_version: u32) -> DbResult<()> {
    upgrade_with(conn, MIGRATIONS, old_version, new_version)
}

/// Returns `PRAGMA user_version` for `conn`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn latest_in(migrations: &[Migration]) -> u32 {
    migrations.last().map_or(0, |migration| migration.version)
}

fn upgrade_with(
    conn: &mut Connection,
    migrations: &[Migration],
    old_version: u32,
    new_version: u32,
) -> DbResult<()> {
    let latest = latest_in(migrations);
    if old_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: old_version,
            latest_supported: latest,
        });
    }
    if new_version < old_version || new_version > latest {
        return Err(DbError::InvalidUpgrade {
            from_version: old_version,
            to_version: new_version,
        });
    }
    if old_version == new_version {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in migrations {
        if migration.version <= old_version || migration.version > new_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        old_version, new_version
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{current_user_version, latest_version, upgrade, upgrade_with, Migration};
    use crate::contract::DATABASE_VERSION;
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn malformed_create_statement_fails_and_leaves_version_untouched() {
        let mut conn = Connection::open_in_memory().unwrap();
        let broken = [Migration {
            version: 1,
            sql: "CREATE TABLE records (_id INTEGER PRIMARY KEY,, album_name TEXT);",
        }];

        let err = upgrade_with(&mut conn, &broken, 0, 1).unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
        assert_eq!(current_user_version(&conn).unwrap(), 0);
    }

    #[test]
    fn failed_later_migration_rolls_back_earlier_ones() {
        let mut conn = Connection::open_in_memory().unwrap();
        let migrations = [
            Migration {
                version: 1,
                sql: "CREATE TABLE first (id INTEGER PRIMARY KEY);",
            },
            Migration {
                version: 2,
                sql: "ALTER TABLE missing ADD COLUMN nope TEXT;",
            },
        ];

        upgrade_with(&mut conn, &migrations, 0, 2).unwrap_err();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'first';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 0);
        assert_eq!(current_user_version(&conn).unwrap(), 0);
    }

    #[test]
    fn upgrade_rejects_downgrade_and_unknown_targets() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert!(matches!(
            upgrade(&mut conn, 1, 0),
            Err(DbError::InvalidUpgrade { .. })
        ));
        assert!(matches!(
            upgrade(&mut conn, 0, 5),
            Err(DbError::InvalidUpgrade { .. })
        ));
        assert!(matches!(
            upgrade(&mut conn, 7, 7),
            Err(DbError::UnsupportedSchemaVersion { db_version: 7, .. })
        ));
    }

    #[test]
    fn registry_tracks_declared_schema_version() {
        assert_eq!(latest_version(), DATABASE_VERSION);
    }
}
