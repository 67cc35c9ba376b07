//! The `userInfo` table schema.
//!
//! The table is created with `CREATE TABLE IF NOT EXISTS`, so ensuring the
//! schema is idempotent and leaves existing rows alone. The statement text is
//! kept byte-for-byte identical to the one used by existing databases.

use rusqlite::Connection;

use crate::transaction::{with_transaction, TxMode};

/// Name of the table holding user credentials.
pub const USER_INFO_TABLE: &str = "userInfo";

/// Statement that creates the `userInfo` table when it is absent.
pub const CREATE_USER_INFO: &str =
    "CREATE TABLE IF NOT EXISTS userInfo(id INTEGER PRIMARY KEY, name TEXT, passwd TEXT)";

/// Ensures the `userInfo` table exists, inside one write transaction.
///
/// # Errors
///
/// Returns the underlying `rusqlite::Error` if the statement or the
/// transaction fails; nothing is changed in that case.
pub fn ensure_schema(conn: &mut Connection) -> rusqlite::Result<()> {
    with_transaction(conn, TxMode::Write, |tx| {
        tx.execute(CREATE_USER_INFO, [])?;
        Ok(())
    })
}

/// Returns whether the `userInfo` table exists.
///
/// # Errors
///
/// Returns the underlying `rusqlite::Error` if `sqlite_master` cannot be
/// queried.
pub fn schema_exists(conn: &Connection) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [USER_INFO_TABLE],
        |row| row.get(0),
    )
}
