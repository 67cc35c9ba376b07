//! SQLite connection opening and configuration.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
        }
    }
}

fn open_flags() -> OpenFlags {
    OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX
}

/// Opens (creating if necessary) the SQLite database file at `path`.
///
/// The journal mode is left at SQLite's default so that files stay readable
/// by other LocalStorage clients.
///
/// # Errors
///
/// Returns the underlying `rusqlite::Error` if the file cannot be opened or
/// configured.
pub fn open_file(path: &Path, settings: DbRuntimeSettings) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(path, open_flags())?;
    configure(&conn, settings)?;
    Ok(conn)
}

/// Opens a private in-memory database. Contents vanish when it is closed.
///
/// # Errors
///
/// Returns the underlying `rusqlite::Error` if SQLite cannot allocate it.
pub fn open_in_memory(settings: DbRuntimeSettings) -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory_with_flags(open_flags())?;
    configure(&conn, settings)?;
    Ok(conn)
}

fn configure(conn: &Connection, settings: DbRuntimeSettings) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(settings.busy_timeout_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_applies_busy_timeout() {
        let settings = DbRuntimeSettings {
            busy_timeout_ms: 2_500,
        };

        let conn = open_in_memory(settings).expect("in-memory open should succeed");

        let busy_timeout: i64 = conn
            .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
            .expect("should query busy_timeout");
        assert_eq!(busy_timeout, 2_500, "busy timeout should match settings");
    }

    #[test]
    fn open_file_creates_database() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("users.sqlite");

        let conn = open_file(&path, DbRuntimeSettings::default()).expect("file open should succeed");
        conn.execute_batch("CREATE TABLE scratch (id INTEGER PRIMARY KEY);")
            .expect("should create table");
        drop(conn);

        assert!(path.exists(), "database file should be created");
    }
}
