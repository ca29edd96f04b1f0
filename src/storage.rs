//! Persistence collaborators for the cookie jar.
//!
//! The jar talks to a synchronous key-value string store through the
//! [`Storage`] trait: it serializes its whole cookie array to a single
//! string value under one well-known key and reads it back the same way.
//! Corrupt or missing data always degrades to an empty jar; only writes
//! and flushes can fail.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;

use crate::Cookie;

/// A synchronous key-value string store the jar persists through.
///
/// Implementations are expected to be local and short-lived in their I/O
/// (a file, an in-memory map), not network-backed.
pub trait Storage {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Makes previously stored values durable.
    fn flush(&mut self) -> Result<(), StorageError>;
}

/// An error that occurred while writing to or flushing the backing store.
#[derive(Debug, thiserror::Error)]
#[error("Failed to write cookies to the backing store")]
pub struct StorageError {
    #[source]
    source: anyhow::Error,
}

impl StorageError {
    /// Wraps an arbitrary error as a [`StorageError`].
    pub fn new<E: Into<anyhow::Error>>(source: E) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// On-disk shape of a single cookie entry.
///
/// `name` and `value` are required; `domain` and `path` are optional;
/// `secure` is present only when true and `expiration` (epoch
/// milliseconds) only when the cookie has one. Session cookies are never
/// written, so a stored entry without an expiration is a data anomaly and
/// gets discarded at load time.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoredCookie {
    pub(crate) name: String,
    pub(crate) value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) path: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub(crate) secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) expiration: Option<i64>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl From<&Cookie<'_>> for StoredCookie {
    fn from(cookie: &Cookie<'_>) -> Self {
        StoredCookie {
            name: cookie.name().to_owned(),
            value: cookie.value().to_owned(),
            domain: cookie.domain().map(str::to_owned),
            path: cookie.path().map(str::to_owned),
            secure: cookie.secure(),
            expiration: cookie
                .expires_datetime()
                .map(|t| (t.unix_timestamp_nanos() / 1_000_000) as i64),
        }
    }
}

impl StoredCookie {
    pub(crate) fn into_cookie(self) -> Cookie<'static> {
        let mut cookie = Cookie::new(self.name, self.value).set_secure(self.secure);
        if let Some(domain) = self.domain {
            cookie = cookie.set_domain(domain);
        }
        if let Some(path) = self.path {
            cookie = cookie.set_path(path);
        }
        // Non-positive timestamps stand in for "no expiration".
        if let Some(millis) = self.expiration.filter(|&millis| millis > 0) {
            if let Ok(t) =
                OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
            {
                cookie = cookie.set_expires(t);
            }
        }
        cookie
    }
}

/// An in-memory [`Storage`] implementation.
///
/// Nothing survives the process: this store is meant for tests and for
/// jars that don't need persistence.
///
/// # Example
///
/// ```rust
/// use barattolo::{MemoryStorage, Storage};
///
/// let mut storage = MemoryStorage::new();
/// storage.put("cookies", "[]").unwrap();
/// assert_eq!(storage.get("cookies").as_deref(), Some("[]"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    /// Creates a new, empty [`MemoryStorage`].
    pub fn new() -> Self {
        Default::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// A [`Storage`] implementation backed by a single JSON file.
///
/// The file holds the full key-value map. It is read once when the store
/// is opened -- a missing or corrupt file yields an empty store, never an
/// error -- and rewritten on [`flush`](Storage::flush), which also syncs
/// the file to disk before returning.
pub struct FileStorage {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStorage {
    /// Opens (or creates the in-memory view of) a file-backed store at
    /// `path`.
    ///
    /// Nothing is written until the first `flush`.
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(error) => {
                    warn!(path = %path.display(), %error, "discarding corrupt storage file");
                    HashMap::new()
                }
            },
            // A missing file is the normal first-run case.
            Err(_) => HashMap::new(),
        };
        Self { path, entries }
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        let contents = serde_json::to_string(&self.entries).map_err(StorageError::new)?;
        let mut file = fs::File::create(&self.path).map_err(StorageError::new)?;
        file.write_all(contents.as_bytes()).map_err(StorageError::new)?;
        file.sync_all().map_err(StorageError::new)
    }
}

#[cfg(test)]
mod tests {
    use super::{FileStorage, MemoryStorage, Storage, StoredCookie};
    use crate::Cookie;
    use time::macros::datetime;

    #[test]
    fn memory_storage_round_trip() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get("cookies"), None);
        storage.put("cookies", "[]").unwrap();
        storage.flush().unwrap();
        assert_eq!(storage.get("cookies").as_deref(), Some("[]"));
    }

    #[test]
    fn stored_cookie_round_trip() {
        let cookie = Cookie::new("sid", "abc123")
            .set_domain("example.com")
            .set_path("/")
            .set_secure(true)
            .set_expires(datetime!(2030-01-01 00:00:00 UTC));
        let stored = StoredCookie::from(&cookie);
        assert_eq!(stored.into_cookie(), cookie);
    }

    #[test]
    fn session_cookies_serialize_without_optional_fields() {
        let stored = StoredCookie::from(&Cookie::new("a", "1"));
        let serialized = serde_json::to_string(&stored).unwrap();
        assert_eq!(serialized, r#"{"name":"a","value":"1"}"#);
    }

    #[test]
    fn non_positive_expiration_reads_back_as_session() {
        let record: StoredCookie =
            serde_json::from_str(r#"{"name":"a","value":"1","expiration":0}"#).unwrap();
        assert!(record.into_cookie().expires().is_session());

        let record: StoredCookie =
            serde_json::from_str(r#"{"name":"a","value":"1","expiration":-5}"#).unwrap();
        assert!(record.into_cookie().expires().is_session());
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        let mut storage = FileStorage::open(&path);
        storage.put("cookies", r#"[{"name":"a","value":"1"}]"#).unwrap();
        storage.flush().unwrap();

        let reopened = FileStorage::open(&path);
        assert_eq!(
            reopened.get("cookies").as_deref(),
            Some(r#"[{"name":"a","value":"1"}]"#)
        );
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "not json at all").unwrap();

        let storage = FileStorage::open(&path);
        assert_eq!(storage.get("cookies"), None);
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("absent.json"));
        assert_eq!(storage.get("cookies"), None);
    }
}
