//! Key-value backends for the poll store.
//!
//! The store only needs two primitives: read a string under a key, and replace
//! the string under a key. Anything that offers them can back a [`crate::PollStore`].

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use snafu::prelude::*;

#[derive(Debug, Snafu)]
pub enum StorageError {
    #[snafu(display("Error writing storage file {}", path.display()))]
    Io { source: io::Error, path: PathBuf },

    #[snafu(display("Error encoding storage file {}", path.display()))]
    Encode {
        source: serde_json::Error,
        path: PathBuf,
    },
}

/// A string-to-string persistent map.
///
/// Reads never fail: a missing key and an unreadable backend both answer `None`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &mut T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// Volatile storage, mostly useful for tests.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// All the keys are kept in a single JSON object on disk.
///
/// The whole file is rewritten on every `set`, through a temporary file that is then
/// renamed over the previous version, so a crash leaves either the old or the new content.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Opens the file at `path`, or starts empty when it does not exist yet.
    ///
    /// A file that cannot be decoded is ignored (and will be overwritten by the next write).
    pub fn open(path: impl AsRef<Path>) -> Result<FileStorage, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        "Storage file {} is not readable, starting from scratch: {}",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Storage file {} does not exist yet", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e).context(IoSnafu { path }),
        };
        debug!(
            "Opened storage {} with {} keys",
            path.display(),
            entries.len()
        );
        Ok(FileStorage { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(&self.entries).context(EncodeSnafu {
            path: self.path.clone(),
        })?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context(IoSnafu {
                    path: parent.to_path_buf(),
                })?;
            }
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, contents).context(IoSnafu { path: tmp.clone() })?;
        fs::rename(&tmp, &self.path).context(IoSnafu {
            path: self.path.clone(),
        })
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let previous = self.entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush() {
            // Keep memory and disk in agreement.
            match previous {
                Some(p) => self.entries.insert(key.to_string(), p),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_overwrites() {
        let mut s = MemoryStorage::new();
        assert_eq!(s.get("k"), None);
        s.set("k", "1").unwrap();
        s.set("k", "2").unwrap();
        assert_eq!(s.get("k"), Some("2".to_string()));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        {
            let mut s = FileStorage::open(&path).unwrap();
            s.set("feelmeter_polls", "[]").unwrap();
            s.set("other", "x").unwrap();
        }
        let s = FileStorage::open(&path).unwrap();
        assert_eq!(s.get("feelmeter_polls"), Some("[]".to_string()));
        assert_eq!(s.get("other"), Some("x".to_string()));
        assert!(!dir.path().join("nested").join("store.json.tmp").exists());
    }

    #[test]
    fn file_storage_ignores_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();
        let mut s = FileStorage::open(&path).unwrap();
        assert_eq!(s.get("anything"), None);
        s.set("k", "v").unwrap();
        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("k"), Some("v".to_string()));
    }

    #[test]
    fn failed_flush_keeps_previous_values() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("sub");
        let path = parent.join("store.json");
        let mut s = FileStorage::open(&path).unwrap();
        s.set("k", "1").unwrap();

        // The directory becomes a regular file, so the next write cannot land.
        fs::remove_dir_all(&parent).unwrap();
        fs::write(&parent, "in the way").unwrap();

        assert!(matches!(s.set("k", "2"), Err(StorageError::Io { .. })));
        assert_eq!(s.get("k"), Some("1".to_string()));
        assert!(s.set("new", "x").is_err());
        assert_eq!(s.get("new"), None);
    }

    #[test]
    fn borrowed_storage_writes_through() {
        fn write_one<S: KeyValueStore>(mut storage: S) {
            storage.set("k", "v").unwrap();
        }
        let mut s = MemoryStorage::new();
        write_one(&mut s);
        assert_eq!(s.get("k"), Some("v".to_string()));
    }
}
