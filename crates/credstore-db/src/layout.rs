//! Offline storage layout.
//!
//! Databases live under `<root>/Databases/`. Each one is a pair of files
//! named after the MD5 digest of the logical database name:
//!
//! ```text
//! <root>/Databases/<md5-hex(name)>.sqlite   the SQLite database
//! <root>/Databases/<md5-hex(name)>.ini      name, version and size metadata
//! ```
//!
//! This is the layout written by Qt Quick LocalStorage, so databases created
//! by the desktop application open unchanged.

use std::fs;
use std::path::{Path, PathBuf};

use credstore_types::DatabaseDescriptor;
use md5::{Digest, Md5};

use crate::error::StoreError;

/// Subdirectory of the storage root that holds database files.
pub const DATABASES_DIR: &str = "Databases";

/// Driver name recorded in metadata files.
const DRIVER: &str = "QSQLITE";

/// Resolved on-disk paths for one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseLocation {
    /// The SQLite database file.
    pub database_file: PathBuf,
    /// The metadata file next to it.
    pub metadata_file: PathBuf,
}

/// Metadata stored next to a database file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseMetadata {
    /// Logical database name.
    pub name: String,
    /// Data version. May be empty.
    pub version: String,
    /// Free-form description.
    pub description: String,
    /// Size hint in bytes.
    pub estimated_size: u64,
    /// SQL driver name.
    pub driver: String,
}

impl From<&DatabaseDescriptor> for DatabaseMetadata {
    fn from(descriptor: &DatabaseDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            version: descriptor.version.clone(),
            description: descriptor.description.clone(),
            estimated_size: descriptor.estimated_size,
            driver: DRIVER.to_string(),
        }
    }
}

/// A directory under which named databases are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineStorage {
    root: PathBuf,
}

impl OfflineStorage {
    /// Creates a storage handle rooted at `root`. Nothing is touched on disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory holding database files.
    pub fn databases_dir(&self) -> PathBuf {
        self.root.join(DATABASES_DIR)
    }

    /// Computes the file paths for the database called `name`.
    pub fn locate(&self, name: &str) -> DatabaseLocation {
        let stem = file_stem(name);
        let dir = self.databases_dir();
        DatabaseLocation {
            database_file: dir.join(format!("{stem}.sqlite")),
            metadata_file: dir.join(format!("{stem}.ini")),
        }
    }

    /// Prepares the files for `descriptor` before the database is opened.
    ///
    /// A database that does not exist yet gets its directory and metadata
    /// file created. For an existing database the recorded version must
    /// match the requested one; an empty version on either side matches
    /// anything. A missing metadata file next to an existing database is
    /// rewritten from the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VersionMismatch`] when the versions differ and
    /// [`StoreError::Io`] on filesystem failures.
    pub fn prepare(&self, descriptor: &DatabaseDescriptor) -> Result<DatabaseLocation, StoreError> {
        let location = self.locate(&descriptor.name);

        if !location.database_file.exists() {
            fs::create_dir_all(self.databases_dir())?;
            write_metadata(&location.metadata_file, &DatabaseMetadata::from(descriptor))?;
            tracing::info!(
                name = %descriptor.name,
                path = %location.database_file.display(),
                "creating new database"
            );
            return Ok(location);
        }

        match read_metadata(&location.metadata_file)? {
            Some(existing) => {
                if !descriptor.version.is_empty()
                    && !existing.version.is_empty()
                    && existing.version != descriptor.version
                {
                    return Err(StoreError::VersionMismatch {
                        expected: descriptor.version.clone(),
                        found: existing.version,
                    });
                }
            }
            None => {
                tracing::warn!(
                    path = %location.metadata_file.display(),
                    "database metadata missing, rewriting from descriptor"
                );
                write_metadata(&location.metadata_file, &DatabaseMetadata::from(descriptor))?;
            }
        }

        Ok(location)
    }
}

/// Returns the lowercase hex MD5 digest of `name`, used as the file stem.
pub fn file_stem(name: &str) -> String {
    hex::encode(Md5::digest(name.as_bytes()))
}

/// Reads a metadata file. Returns `Ok(None)` if it does not exist.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file exists but cannot be read.
pub fn read_metadata(path: &Path) -> Result<Option<DatabaseMetadata>, StoreError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(parse_metadata(&contents, path))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::Io(e)),
    }
}

/// Writes a metadata file, replacing any existing one.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file cannot be written.
pub fn write_metadata(path: &Path, metadata: &DatabaseMetadata) -> Result<(), StoreError> {
    fs::write(path, render_metadata(metadata))?;
    Ok(())
}

/// Renders metadata in QSettings INI form. Keys are written in sorted order.
fn render_metadata(metadata: &DatabaseMetadata) -> String {
    format!(
        "[General]\nDescription={}\nDriver={}\nEstimatedSize={}\nName={}\nVersion={}\n",
        quote_value(&metadata.description),
        quote_value(&metadata.driver),
        metadata.estimated_size,
        quote_value(&metadata.name),
        quote_value(&metadata.version),
    )
}

fn parse_metadata(contents: &str, path: &Path) -> DatabaseMetadata {
    let mut metadata = DatabaseMetadata::default();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('[') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = unquote_value(value.trim());
        match key.trim() {
            "Name" => metadata.name = value,
            "Version" => metadata.version = value,
            "Description" => metadata.description = value,
            "Driver" => metadata.driver = value,
            // Only a hint; a bad value must not make the database unopenable.
            "EstimatedSize" => match value.parse() {
                Ok(size) => metadata.estimated_size = size,
                Err(_) => tracing::warn!(
                    path = %path.display(),
                    value = %value,
                    "ignoring non-numeric EstimatedSize in database metadata"
                ),
            },
            _ => {}
        }
    }

    metadata
}

/// Quotes and escapes a value the way QSettings does, so every value stays
/// on one line.
fn quote_value(value: &str) -> String {
    let needs_quotes = value != value.trim()
        || value
            .chars()
            .any(|c| c.is_control() || matches!(c, ';' | ',' | '=' | '"' | '\\' | '#'));
    if !needs_quotes {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => quoted.push_str(&format!("\\x{:04x}", u32::from(c))),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Strips surrounding quotes and decodes QSettings escape sequences.
fn unquote_value(value: &str) -> String {
    let inner = value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value);

    let mut decoded = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => decoded.push('\n'),
            Some('r') => decoded.push('\r'),
            Some('t') => decoded.push('\t'),
            Some('0') => decoded.push('\0'),
            Some('x') => {
                let mut code = 0u32;
                let mut digits = 0;
                while digits < 4 {
                    let Some(digit) = chars.peek().and_then(|d| d.to_digit(16)) else {
                        break;
                    };
                    code = code * 16 + digit;
                    digits += 1;
                    chars.next();
                }
                match char::from_u32(code).filter(|_| digits > 0) {
                    Some(ch) => decoded.push(ch),
                    None => decoded.push('x'),
                }
            }
            Some(other) => decoded.push(other),
            None => decoded.push('\\'),
        }
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_is_md5_of_name() {
        // md5("temp")
        assert_eq!(file_stem("temp"), "3d801aa532c1cec3ee82d87a99fdf63f");
        assert_eq!(file_stem("temp").len(), 32);
        assert_ne!(file_stem("temp"), file_stem("temp2"));
    }

    #[test]
    fn locate_builds_paths_under_databases_dir() {
        let storage = OfflineStorage::new("/data");
        let location = storage.locate("temp");
        let stem = file_stem("temp");
        assert_eq!(
            location.database_file,
            PathBuf::from("/data/Databases").join(format!("{stem}.sqlite"))
        );
        assert_eq!(
            location.metadata_file,
            PathBuf::from("/data/Databases").join(format!("{stem}.ini"))
        );
    }

    #[test]
    fn metadata_renders_in_qsettings_layout() {
        let metadata = DatabaseMetadata::from(&DatabaseDescriptor::default());
        assert_eq!(
            render_metadata(&metadata),
            "[General]\nDescription=tempDB\nDriver=QSQLITE\nEstimatedSize=1000\nName=temp\nVersion=1.0\n"
        );
    }

    #[test]
    fn metadata_parses_back() {
        let metadata = DatabaseMetadata {
            name: "users".to_string(),
            version: "2.0".to_string(),
            description: "a; quoted \"description\" with a \\ backslash".to_string(),
            estimated_size: 4096,
            driver: DRIVER.to_string(),
        };
        let rendered = render_metadata(&metadata);
        let parsed = parse_metadata(&rendered, Path::new("users.ini"));
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn multi_line_description_stays_on_one_line() {
        let metadata = DatabaseMetadata {
            description: "line one\nEstimatedSize=oops\r\tend\u{1}".to_string(),
            ..DatabaseMetadata::from(&DatabaseDescriptor::default())
        };
        let rendered = render_metadata(&metadata);
        assert_eq!(rendered.lines().count(), 6, "one header and five keys: {rendered}");
        assert!(rendered.contains("Description=\"line one\\nEstimatedSize=oops\\r\\tend\\x0001\""));

        let parsed = parse_metadata(&rendered, Path::new("temp.ini"));
        assert_eq!(parsed, metadata);
        assert_eq!(parsed.estimated_size, 1000);
    }

    #[test]
    fn non_ascii_values_round_trip() {
        let metadata = DatabaseMetadata {
            name: "benutzer".to_string(),
            description: "Zugangsdaten für Müller, 用户".to_string(),
            ..DatabaseMetadata::from(&DatabaseDescriptor::default())
        };
        let parsed = parse_metadata(&render_metadata(&metadata), Path::new("benutzer.ini"));
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn escaped_code_points_are_decoded() {
        assert_eq!(unquote_value("\"caf\\x00e9\""), "café");
        assert_eq!(unquote_value("plain"), "plain");
        assert_eq!(unquote_value("\"trailing\\\""), "trailing\\");
    }

    #[test]
    fn metadata_with_bad_size_is_ignored() {
        let parsed = parse_metadata(
            "[General]\nEstimatedSize=lots\nVersion=1.0\n",
            Path::new("x.ini"),
        );
        assert_eq!(parsed.estimated_size, 0);
        assert_eq!(parsed.version, "1.0");
    }

    #[test]
    fn database_with_multi_line_description_reopens() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let storage = OfflineStorage::new(dir.path());
        let descriptor = DatabaseDescriptor {
            description: "x\nEstimatedSize=big".to_string(),
            ..DatabaseDescriptor::default()
        };
        let location = storage.prepare(&descriptor).expect("first prepare should succeed");
        fs::write(&location.database_file, b"").expect("should create database file");

        storage
            .prepare(&descriptor)
            .expect("second prepare should succeed");
        let metadata = read_metadata(&location.metadata_file)
            .expect("metadata should be readable")
            .expect("metadata should exist");
        assert_eq!(metadata.description, "x\nEstimatedSize=big");
    }

    #[test]
    fn prepare_creates_directory_and_metadata() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let storage = OfflineStorage::new(dir.path());
        let location = storage
            .prepare(&DatabaseDescriptor::default())
            .expect("prepare should succeed");

        assert!(storage.databases_dir().is_dir());
        let metadata = read_metadata(&location.metadata_file)
            .expect("metadata should be readable")
            .expect("metadata should exist");
        assert_eq!(metadata.name, "temp");
        assert_eq!(metadata.version, "1.0");
        assert_eq!(metadata.driver, "QSQLITE");
    }

    #[test]
    fn prepare_rejects_version_mismatch_for_existing_database() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let storage = OfflineStorage::new(dir.path());
        let location = storage
            .prepare(&DatabaseDescriptor::default())
            .expect("first prepare should succeed");
        fs::write(&location.database_file, b"").expect("should create database file");

        let newer = DatabaseDescriptor {
            version: "2.0".to_string(),
            ..DatabaseDescriptor::default()
        };
        let err = storage.prepare(&newer).expect_err("version mismatch should fail");
        match err {
            StoreError::VersionMismatch { expected, found } => {
                assert_eq!(expected, "2.0");
                assert_eq!(found, "1.0");
            }
            other => panic!("unexpected error type: {other:?}"),
        }

        let any_version = DatabaseDescriptor {
            version: String::new(),
            ..DatabaseDescriptor::default()
        };
        storage
            .prepare(&any_version)
            .expect("empty requested version should match anything");
    }

    #[test]
    fn prepare_rewrites_missing_metadata_for_existing_database() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let storage = OfflineStorage::new(dir.path());
        let location = storage.locate("temp");
        fs::create_dir_all(storage.databases_dir()).expect("should create databases dir");
        fs::write(&location.database_file, b"").expect("should create database file");

        storage
            .prepare(&DatabaseDescriptor::default())
            .expect("prepare should succeed");
        assert!(location.metadata_file.exists(), "metadata should be rewritten");
    }
}
