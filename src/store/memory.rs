//! In-memory blob store.

use rustc_hash::FxHashMap;

use super::{BlobStore, StoreError};

/// Ephemeral [`BlobStore`] backed by a hash map.
///
/// Used in tests and for sessions where durability is not wanted; saved blobs
/// live only as long as the store itself.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: FxHashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Check if the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl BlobStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.blobs.get(key).cloned()
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), StoreError> {
        self.blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}
