//! Scoped transactions.
//!
//! Every store operation runs its statements through [`with_transaction`]:
//! the body sees a live [`Transaction`], a successful body is committed, and
//! any other exit (an `Err` from the body or a panic unwinding through it)
//! drops the transaction, which rolls it back.

use rusqlite::{Connection, Transaction, TransactionBehavior};

/// How a transaction acquires its locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    /// Statements only read. Locks are taken lazily on the first read.
    Read,
    /// Statements write. The write lock is taken up front so the body never
    /// fails halfway on lock upgrade.
    Write,
}

impl TxMode {
    fn behavior(self) -> TransactionBehavior {
        match self {
            Self::Read => TransactionBehavior::Deferred,
            Self::Write => TransactionBehavior::Immediate,
        }
    }
}

/// Runs `body` inside a transaction and commits it if `body` succeeds.
///
/// # Errors
///
/// Returns the body's error (after rollback), or an error converted from
/// `rusqlite::Error` if the transaction cannot begin or commit.
pub fn with_transaction<T, E, F>(conn: &mut Connection, mode: TxMode, body: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    let tx = conn.transaction_with_behavior(mode.behavior())?;
    let value = body(&tx)?;
    tx.commit()?;
    Ok(value)
}
