//! Connection setup for the SQLite backend.
//!
//! The schema lives in `migrations/` and is applied with `rusqlite_migration`,
//! which tracks progress in SQLite's `user_version` pragma.

use std::time::Duration;

use rusqlite::Connection;
use rusqlite_migration::{Migrations, M};

use crate::error::StorageError;

/// Diagram rows are written by the auto-save worker while other sessions read,
/// so a writer waits this long for the lock instead of failing at once.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a [`Connection`] points.
#[derive(Debug, Clone, Copy)]
pub enum Location<'a> {
    File(&'a str),
    Memory,
}

fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(include_str!(
        "migrations/001_initial_schema.sql"
    ))])
}

/// Opens a connection and brings the schema up to date.
pub fn connect(location: Location<'_>) -> Result<Connection, StorageError> {
    let mut conn = match location {
        Location::File(path) => {
            let conn = Connection::open(path)?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn
        }
        Location::Memory => Connection::open_in_memory()?,
    };
    conn.busy_timeout(BUSY_TIMEOUT)?;

    migrations()
        .to_latest(&mut conn)
        .map_err(|e| StorageError::Migration(e.to_string()))?;
    Ok(conn)
}

/// Number of migrations applied to `conn`.
pub fn schema_version(conn: &Connection) -> Result<u32, StorageError> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_valid() {
        assert!(migrations().validate().is_ok());
    }

    #[test]
    fn memory_connection_has_every_table() {
        let conn = connect(Location::Memory).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 1);
        for table in ["project_diagrams", "diagram_templates", "env_config"] {
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert!(exists, "missing table {table}");
        }
    }

    #[test]
    fn reopening_a_file_does_not_rerun_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.db");
        let path = path.to_str().unwrap();
        drop(connect(Location::File(path)).unwrap());
        let conn = connect(Location::File(path)).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 1);
        let mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }
}
