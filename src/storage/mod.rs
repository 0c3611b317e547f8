//! Persistent key/value slots
//!
//! The console exposes numbered string slots (`dget`/`dset`). Gameplay
//! only needs slot 0, holding the index of the level last reached.
//!
//! - `MemoryStore`: process lifetime only (tests, WASM)
//! - `FileStore`: RON file, written through on every `set`

pub mod local;

pub use local::FileStore;

use std::collections::BTreeMap;

use crate::error::ConsoleError;

/// Slot holding the current level index
pub const LEVEL_SLOT: u32 = 0;

/// Numbered string slots.
pub trait KeyValueStore {
    fn get(&self, slot: u32) -> Option<String>;
    fn set(&mut self, slot: u32, value: &str) -> Result<(), ConsoleError>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: BTreeMap<u32, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, slot: u32) -> Option<String> {
        self.slots.get(&slot).cloned()
    }

    fn set(&mut self, slot: u32, value: &str) -> Result<(), ConsoleError> {
        self.slots.insert(slot, value.to_string());
        Ok(())
    }
}

/// Level index stored in `LEVEL_SLOT`, if it parses.
pub fn saved_level(store: &dyn KeyValueStore) -> Option<u32> {
    let raw = store.get(LEVEL_SLOT)?;
    match raw.trim().parse() {
        Ok(level) => Some(level),
        Err(_) => {
            tracing::warn!(value = %raw, "ignoring unparsable saved level");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_overwrites() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get(0), None);
        store.set(0, "3").unwrap();
        store.set(0, "4").unwrap();
        assert_eq!(store.get(0).as_deref(), Some("4"));
    }

    #[test]
    fn test_saved_level_parses_slot_zero() {
        let mut store = MemoryStore::new();
        assert_eq!(saved_level(&store), None);
        store.set(LEVEL_SLOT, "12").unwrap();
        assert_eq!(saved_level(&store), Some(12));
        store.set(LEVEL_SLOT, "twelve").unwrap();
        assert_eq!(saved_level(&store), None);
    }
}
