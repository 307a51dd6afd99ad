//! File-backed blob store.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::warn;

use super::{BlobStore, StoreError};

/// Durable [`BlobStore`] keeping one file per key under a root directory.
///
/// The on-disk analogue of the browser storage the storefront originally used:
/// small JSON blobs, rewritten whole on every save.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the root directory could not be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();

        fs::create_dir_all(&root).map_err(|source| StoreError::Root {
            root: root.display().to_string(),
            source,
        })?;

        Ok(FileStore { root })
    }

    /// Directory the store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl BlobStore for FileStore {
    fn load(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);

        match fs::read_to_string(&path) {
            Ok(blob) => Some(blob),
            Err(error) if error.kind() == ErrorKind::NotFound => None,
            Err(error) => {
                // Unreadable counts as absent; the record layer fails open.
                warn!(key, path = %path.display(), %error, "failed to read blob");
                None
            }
        }
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), StoreError> {
        fs::write(self.path_for(key), blob).map_err(|source| StoreError::Write {
            key: key.to_string(),
            source,
        })
    }
}
