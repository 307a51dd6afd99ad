//! Persistence port.
//!
//! A narrow, synchronous seam over durable key-value storage. Every durable
//! read and write in the core goes through [`BlobStore`], so the ledger's
//! persist-before-return guarantee lives in one place instead of being a
//! convention repeated at each call site.
//!
//! Records are JSON blobs. Decoding is corruption-tolerant: a malformed blob
//! fails open to the record's default value and is logged, since losing state
//! is preferred over losing the whole session.

mod file;
mod memory;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::warn;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Keys of the records the core persists.
pub mod keys {
    /// Ordered list of cart entries.
    pub const CART: &str = "cart";

    /// Append-only list of purchases.
    pub const PURCHASES: &str = "purchases";

    /// Playback preferences (volume only).
    pub const PREFERENCES: &str = "preferences";

    /// Favorited tracks.
    pub const FAVORITES: &str = "favorites";
}

/// Errors related to writing records through the port.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The blob could not be written to the underlying storage.
    #[error("failed to write key {key:?}: {source}")]
    Write {
        /// Key being written.
        key: String,

        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The storage root could not be prepared.
    #[error("failed to prepare store root {root:?}: {source}")]
    Root {
        /// Directory the store was asked to use.
        root: String,

        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A record could not be encoded as JSON.
    #[error("failed to encode record for key {key:?}: {source}")]
    Encode {
        /// Key being written.
        key: String,

        /// The underlying encode error.
        source: serde_json::Error,
    },
}

/// Durable, synchronous storage of string-keyed blobs.
pub trait BlobStore {
    /// Load the blob stored under `key`, if any.
    fn load(&self, key: &str) -> Option<String>;

    /// Durably store `blob` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the blob could not be written.
    fn save(&mut self, key: &str, blob: &str) -> Result<(), StoreError>;
}

/// Load and decode the record stored under `key`.
///
/// Fails open: a missing or malformed blob yields the record's default value,
/// and corruption is logged rather than propagated.
pub fn load_record<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: BlobStore + ?Sized,
{
    let Some(blob) = store.load(key) else {
        return T::default();
    };

    match serde_json::from_str(&blob) {
        Ok(record) => record,
        Err(error) => {
            warn!(key, %error, "discarding corrupt record");
            T::default()
        }
    }
}

/// Encode the record as JSON and store it under `key`.
///
/// # Errors
///
/// Returns a [`StoreError`] if the record could not be encoded or written.
pub fn save_record<T, S>(store: &mut S, key: &str, record: &T) -> Result<(), StoreError>
where
    T: Serialize,
    S: BlobStore + ?Sized,
{
    let blob = serde_json::to_string(record).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;

    store.save(key, &blob)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Counter {
        count: u32,
    }

    #[test]
    fn records_round_trip() -> TestResult {
        let mut store = MemoryStore::default();

        save_record(&mut store, "counter", &Counter { count: 3 })?;
        let loaded: Counter = load_record(&store, "counter");

        assert_eq!(loaded, Counter { count: 3 });

        Ok(())
    }

    #[test]
    fn missing_key_loads_default() {
        let store = MemoryStore::default();

        let loaded: Counter = load_record(&store, "counter");

        assert_eq!(loaded, Counter::default());
    }

    #[test]
    fn corrupt_blob_fails_open_to_default() -> TestResult {
        let mut store = MemoryStore::default();
        store.save("counter", "{not json")?;

        let loaded: Counter = load_record(&store, "counter");

        assert_eq!(loaded, Counter::default());

        Ok(())
    }
}
