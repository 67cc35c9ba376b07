//! The user credential store.
//!
//! [`UserStore`] owns at most one SQLite connection. `open` creates it,
//! `close` releases it, and every CRUD operation runs its single statement
//! inside one transaction on it. Operations on a store without a connection
//! return [`StoreError::NotOpen`] and touch nothing.

use std::path::{Path, PathBuf};

use credstore_types::{Credentials, DatabaseDescriptor, StoreState, UserId, UserRecord};
use rusqlite::{params, Connection, Row};

use crate::connection::{self, DbRuntimeSettings};
use crate::error::StoreError;
use crate::layout::OfflineStorage;
use crate::schema;
use crate::transaction::{with_transaction, TxMode};

const SELECT_ALL_USERS: &str = "SELECT * FROM userInfo";
const INSERT_USER: &str = "INSERT INTO userInfo (name, passwd) VALUES (?1, ?2)";
const UPDATE_USER: &str = "UPDATE userInfo SET name = ?1, passwd = ?2 WHERE id = ?3";
const DELETE_USER: &str = "DELETE FROM userInfo WHERE id = ?1";

/// Where a store keeps its database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// A file under an offline storage root.
    Offline(OfflineStorage),
    /// A private in-memory database, discarded on close.
    InMemory,
}

/// Everything needed to open a [`UserStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Where the database lives.
    pub storage: Storage,
    /// Which database to open.
    pub descriptor: DatabaseDescriptor,
    /// Connection tunables.
    pub runtime: DbRuntimeSettings,
    /// Ensure the `userInfo` table as part of `open`.
    pub create_schema_on_open: bool,
}

impl StoreOptions {
    /// Options for the default database under the storage root `root`.
    pub fn offline(root: impl Into<PathBuf>) -> Self {
        Self {
            storage: Storage::Offline(OfflineStorage::new(root)),
            descriptor: DatabaseDescriptor::default(),
            runtime: DbRuntimeSettings::default(),
            create_schema_on_open: true,
        }
    }

    /// Options for a throwaway in-memory database.
    pub fn in_memory() -> Self {
        Self {
            storage: Storage::InMemory,
            descriptor: DatabaseDescriptor::default(),
            runtime: DbRuntimeSettings::default(),
            create_schema_on_open: true,
        }
    }

    /// Replaces the database descriptor.
    pub fn with_descriptor(mut self, descriptor: DatabaseDescriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// Replaces the connection tunables.
    pub fn with_runtime(mut self, runtime: DbRuntimeSettings) -> Self {
        self.runtime = runtime;
        self
    }

    /// Sets whether `open` also ensures the schema.
    pub fn with_schema_on_open(mut self, create_schema_on_open: bool) -> Self {
        self.create_schema_on_open = create_schema_on_open;
        self
    }
}

/// A credential store over one explicitly owned SQLite connection.
///
/// Methods take `&mut self`, so one store never runs two transactions at
/// once. Separate stores are fully independent.
#[derive(Debug)]
pub struct UserStore {
    options: StoreOptions,
    conn: Option<Connection>,
    state: StoreState,
    database_path: Option<PathBuf>,
}

impl UserStore {
    /// Creates an unopened store. Nothing is touched until [`open`](Self::open).
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            conn: None,
            state: StoreState::Unopened,
            database_path: None,
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> StoreState {
        self.state
    }

    /// Returns `true` while a connection is held.
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Returns the database file of the last successful open, if it was
    /// file-backed.
    pub fn database_path(&self) -> Option<&Path> {
        self.database_path.as_deref()
    }

    /// Opens the database, creating it if necessary.
    ///
    /// Opening an already-open store keeps the existing connection. A closed
    /// store can be opened again. With `create_schema_on_open` the schema is
    /// ensured before the connection is kept, so a failed open never leaves a
    /// half-initialized handle behind.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VersionMismatch`] if an existing database holds a
    /// different data version, and [`StoreError::Database`] or
    /// [`StoreError::Io`] if the files cannot be prepared or opened.
    pub fn open(&mut self) -> Result<(), StoreError> {
        if self.conn.is_some() {
            tracing::debug!(name = %self.options.descriptor.name, "user store already open");
            return Ok(());
        }

        let (mut conn, path) = match &self.options.storage {
            Storage::Offline(storage) => {
                let location = storage.prepare(&self.options.descriptor)?;
                let conn = connection::open_file(&location.database_file, self.options.runtime)?;
                (conn, Some(location.database_file))
            }
            Storage::InMemory => (connection::open_in_memory(self.options.runtime)?, None),
        };

        let state = if self.options.create_schema_on_open {
            schema::ensure_schema(&mut conn)?;
            StoreState::SchemaReady
        } else {
            StoreState::Open
        };

        let shown_path = path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string());
        tracing::info!(
            name = %self.options.descriptor.name,
            version = %self.options.descriptor.version,
            path = %shown_path,
            state = state.label(),
            "opened user store"
        );

        self.conn = Some(conn);
        self.database_path = path;
        self.state = state;
        Ok(())
    }

    /// Closes the database.
    ///
    /// Closing a store that is not open does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if SQLite refuses to close the
    /// connection; the store then stays open.
    pub fn close(&mut self) -> Result<(), StoreError> {
        let Some(conn) = self.conn.take() else {
            tracing::debug!("close called on a user store that is not open");
            return Ok(());
        };

        if let Err((conn, e)) = conn.close() {
            self.conn = Some(conn);
            return Err(StoreError::Database(e));
        }

        self.state = StoreState::Closed;
        tracing::info!(name = %self.options.descriptor.name, "closed user store");
        Ok(())
    }

    /// Creates the `userInfo` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotOpen`] without a connection and
    /// [`StoreError::Database`] if the statement fails.
    pub fn init_schema(&mut self) -> Result<(), StoreError> {
        schema::ensure_schema(self.handle()?)?;
        self.state = StoreState::SchemaReady;
        Ok(())
    }

    /// Returns every row of the `userInfo` table in SQLite's natural order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotOpen`] without a connection and
    /// [`StoreError::Database`] if the query fails, e.g. because the schema
    /// was never created.
    pub fn read_all(&mut self) -> Result<Vec<UserRecord>, StoreError> {
        let users = with_transaction(self.handle()?, TxMode::Read, |tx| {
            let mut stmt = tx.prepare(SELECT_ALL_USERS)?;
            let rows = stmt.query_map([], user_from_row)?;

            let mut users = Vec::new();
            for row in rows {
                users.push(row?);
            }
            Ok::<_, StoreError>(users)
        })?;

        tracing::debug!(count = users.len(), "read user records");
        Ok(users)
    }

    /// Inserts a new record and returns the id SQLite assigned to it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotOpen`] without a connection and
    /// [`StoreError::Database`] if the insert fails.
    pub fn create(&mut self, credentials: &Credentials) -> Result<UserId, StoreError> {
        let id = with_transaction(self.handle()?, TxMode::Write, |tx| {
            tx.execute(INSERT_USER, params![credentials.name, credentials.passwd])?;
            Ok::<_, StoreError>(UserId(tx.last_insert_rowid()))
        })?;

        tracing::debug!(%id, "created user record");
        Ok(id)
    }

    /// Overwrites the name and password of the record with `id`.
    ///
    /// Returns the number of rows changed: `1`, or `0` if no record has
    /// that id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotOpen`] without a connection and
    /// [`StoreError::Database`] if the update fails.
    pub fn update(&mut self, id: UserId, credentials: &Credentials) -> Result<usize, StoreError> {
        let affected = with_transaction(self.handle()?, TxMode::Write, |tx| {
            let affected = tx.execute(
                UPDATE_USER,
                params![credentials.name, credentials.passwd, id.get()],
            )?;
            Ok::<_, StoreError>(affected)
        })?;

        tracing::debug!(%id, affected, "updated user record");
        Ok(affected)
    }

    /// Deletes the record with `id`.
    ///
    /// Returns the number of rows removed: `1`, or `0` if no record has
    /// that id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotOpen`] without a connection and
    /// [`StoreError::Database`] if the delete fails.
    pub fn delete(&mut self, id: UserId) -> Result<usize, StoreError> {
        let affected = with_transaction(self.handle()?, TxMode::Write, |tx| {
            let affected = tx.execute(DELETE_USER, params![id.get()])?;
            Ok::<_, StoreError>(affected)
        })?;

        tracing::debug!(%id, affected, "deleted user record");
        Ok(affected)
    }

    fn handle(&mut self) -> Result<&mut Connection, StoreError> {
        self.conn.as_mut().ok_or(StoreError::NotOpen)
    }
}

// Other LocalStorage clients may have written NULL names or passwords.
fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: UserId(row.get("id")?),
        name: row.get::<_, Option<String>>("name")?.unwrap_or_default(),
        passwd: row.get::<_, Option<String>>("passwd")?.unwrap_or_default(),
    })
}
