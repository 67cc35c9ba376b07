//! Configuration-driven entry point for the credential store.
//!
//! Applications call [`config::load_config`], install logging with
//! [`telemetry::init_tracing`], then obtain a ready store from
//! [`open_store`]:
//!
//! ```rust,ignore
//! let config = credstore::config::load_default_config()?;
//! credstore::telemetry::init_tracing(&config.logging);
//!
//! let mut store = credstore::open_store(&config)?;
//! let id = store.create(&Credentials::new("alice", "p1"))?;
//! store.close()?;
//! ```

pub mod config;
pub mod telemetry;

pub use credstore_db::{StoreError, StoreOptions, UserStore};
pub use credstore_types::{Credentials, DatabaseDescriptor, StoreState, UserId, UserRecord};

use thiserror::Error;

use crate::config::{Config, ConfigError};

/// Errors that can occur while bringing up a store from configuration.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The store could not be opened or its schema created.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Opens the store described by `config` and ensures its schema.
///
/// The schema is ensured even when `storage.create_schema_on_open` is off,
/// so the returned store is always in [`StoreState::SchemaReady`].
///
/// # Errors
///
/// Returns [`BootstrapError::Store`] if the database cannot be opened or the
/// `userInfo` table cannot be created.
pub fn open_store(config: &Config) -> Result<UserStore, BootstrapError> {
    let mut store = UserStore::new(config.storage.store_options());
    store.open()?;
    if store.state() != StoreState::SchemaReady {
        store.init_schema()?;
    }

    tracing::info!(
        root = %config.storage.offline_storage_path.display(),
        name = %config.storage.name,
        "credential store ready"
    );
    Ok(store)
}

/// Loads configuration from the default location and opens the store.
///
/// # Errors
///
/// Returns [`BootstrapError::Config`] if the configuration cannot be loaded
/// and [`BootstrapError::Store`] if the store cannot be opened.
pub fn open_default_store() -> Result<UserStore, BootstrapError> {
    let config = config::load_default_config()?;
    open_store(&config)
}
