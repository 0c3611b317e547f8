//! File-backed slot store
//!
//! Slots are kept in memory and the whole map is rewritten as RON on every
//! `set`, so a crash never loses an acknowledged write.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::KeyValueStore;
use crate::error::ConsoleError;

/// RON file store
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    slots: BTreeMap<u32, String>,
}

impl FileStore {
    /// Open a store at `path`. A missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConsoleError> {
        let path = path.into();
        let slots = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            ron::from_str(&contents)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, slots })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), ConsoleError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = ron::ser::to_string_pretty(&self.slots, ron::ser::PrettyConfig::default())?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, slot: u32) -> Option<String> {
        self.slots.get(&slot).cloned()
    }

    fn set(&mut self, slot: u32, value: &str) -> Result<(), ConsoleError> {
        self.slots.insert(slot, value.to_string());
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("save.ron")).unwrap();
        assert_eq!(store.get(0), None);
    }

    #[test]
    fn test_set_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("save.ron");

        let mut store = FileStore::open(&path).unwrap();
        store.set(0, "7").unwrap();
        store.set(3, "hello").unwrap();
        assert!(path.exists());

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(0).as_deref(), Some("7"));
        assert_eq!(reopened.get(3).as_deref(), Some("hello"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.ron");
        fs::write(&path, "{ not ron").unwrap();
        assert!(matches!(FileStore::open(&path), Err(ConsoleError::Config(_))));
    }
}
