//! Shared types for the credstore workspace.
//!
//! This crate holds the domain vocabulary used by both the database layer
//! (`credstore-db`) and the configuration surface (`credstore`): the user
//! record, the typed credential pair bound into SQL statements, the
//! database descriptor, and the lifecycle state of a store.
//!
//! It has no database dependency so that callers which only display or
//! transport records do not link SQLite.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the database used by the credential store.
pub const DEFAULT_DATABASE_NAME: &str = "temp";

/// Version string recorded alongside the database.
pub const DEFAULT_DATABASE_VERSION: &str = "1.0";

/// Human-readable description recorded alongside the database.
pub const DEFAULT_DATABASE_DESCRIPTION: &str = "tempDB";

/// Storage size hint recorded alongside the database.
pub const DEFAULT_ESTIMATED_SIZE: u64 = 1000;

/// Primary key of a row in the `userInfo` table.
///
/// Assigned by SQLite on insert and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Returns the raw row id.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The `(name, passwd)` pair written by inserts and updates.
///
/// `passwd` is stored as given. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account name. Duplicates are allowed.
    pub name: String,
    /// Password, stored in clear form.
    pub passwd: String,
}

impl Credentials {
    /// Creates a credential pair.
    pub fn new(name: impl Into<String>, passwd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passwd: passwd.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("name", &self.name)
            .field("passwd", &"<redacted>")
            .finish()
    }
}

/// One persisted row of the `userInfo` table.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Engine-assigned primary key.
    pub id: UserId,
    /// Account name.
    pub name: String,
    /// Password, stored in clear form.
    pub passwd: String,
}

impl UserRecord {
    /// Returns the record's credential pair.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.name.clone(), self.passwd.clone())
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("passwd", &"<redacted>")
            .finish()
    }
}

/// Identity of a local database: what it is called, which version of the
/// data it holds, and the metadata stored next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseDescriptor {
    /// Logical database name. The on-disk file name is derived from it.
    pub name: String,
    /// Data version. An existing database with a different version is
    /// refused on open.
    pub version: String,
    /// Free-form description.
    pub description: String,
    /// Size hint in bytes. Informational only.
    pub estimated_size: u64,
}

impl Default for DatabaseDescriptor {
    fn default() -> Self {
        Self {
            name: DEFAULT_DATABASE_NAME.to_string(),
            version: DEFAULT_DATABASE_VERSION.to_string(),
            description: DEFAULT_DATABASE_DESCRIPTION.to_string(),
            estimated_size: DEFAULT_ESTIMATED_SIZE,
        }
    }
}

/// Lifecycle state of a user store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreState {
    /// `open` has never been called.
    Unopened,
    /// A handle exists but the schema has not been ensured.
    Open,
    /// A handle exists and the `userInfo` table is known to exist.
    SchemaReady,
    /// The handle was closed.
    Closed,
}

impl StoreState {
    /// Returns the string label for this state.
    pub fn label(self) -> &'static str {
        match self {
            Self::Unopened => "UNOPENED",
            Self::Open => "OPEN",
            Self::SchemaReady => "SCHEMA_READY",
            Self::Closed => "CLOSED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_descriptor_matches_legacy_identifiers() {
        let descriptor = DatabaseDescriptor::default();
        assert_eq!(descriptor.name, "temp");
        assert_eq!(descriptor.version, "1.0");
        assert_eq!(descriptor.description, "tempDB");
        assert_eq!(descriptor.estimated_size, 1000);
    }

    #[test]
    fn debug_output_redacts_passwords() {
        let creds = Credentials::new("alice", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));

        let record = UserRecord {
            id: UserId(7),
            name: "alice".to_string(),
            passwd: "hunter2".to_string(),
        };
        let rendered = format!("{record:?}");
        assert!(rendered.contains("UserId(7)"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn user_record_serializes_with_plain_id() {
        let record = UserRecord {
            id: UserId(3),
            name: "bob".to_string(),
            passwd: "p2".to_string(),
        };
        let json = serde_json::to_value(&record).expect("record should serialize");
        assert_eq!(json["id"], 3);
        assert_eq!(json["name"], "bob");
        assert_eq!(json["passwd"], "p2");
    }

    #[test]
    fn state_labels() {
        assert_eq!(StoreState::Unopened.label(), "UNOPENED");
        assert_eq!(StoreState::Closed.label(), "CLOSED");
        assert_eq!(StoreState::SchemaReady.label(), "SCHEMA_READY");
    }
}
