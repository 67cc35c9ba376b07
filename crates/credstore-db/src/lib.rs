//! Database layer for the credential store.
//!
//! Provides the [`UserStore`] over a single SQLite connection: opening a
//! named local database, ensuring the `userInfo` table, and the four CRUD
//! operations, each run inside its own transaction.
//!
//! # Design decisions
//!
//! - **One owned connection, no pool**: a store holds at most one
//!   `rusqlite::Connection`. Callers that want isolation create more stores.
//! - **Explicit `NotOpen`**: operations on a store without a connection return
//!   [`StoreError::NotOpen`] instead of silently doing nothing.
//! - **Legacy on-disk layout**: file-backed databases are found through
//!   [`OfflineStorage`], which reproduces the Qt LocalStorage naming scheme and
//!   metadata file so existing databases keep working.

mod connection;
mod error;
mod layout;
mod schema;
mod store;
mod transaction;

pub use connection::DbRuntimeSettings;
pub use error::StoreError;
pub use layout::{
    file_stem, read_metadata, DatabaseLocation, DatabaseMetadata, OfflineStorage, DATABASES_DIR,
};
pub use schema::{ensure_schema, schema_exists, CREATE_USER_INFO, USER_INFO_TABLE};
pub use store::{Storage, StoreOptions, UserStore};
pub use transaction::{with_transaction, TxMode};
