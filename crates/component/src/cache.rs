use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::ComponentError;

/// Disk-backed byte cache owned by one component instance.
///
/// Entries live at `<root>/<sha256(key)>`. Nothing touches the filesystem
/// until the first [`put`](Self::put), so building a cache is free and can be
/// repeated on every load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        self.root.join(hex::encode(hasher.finalize()))
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ComponentError> {
        match fs::read(self.entry_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Write an entry. The bytes land in a temp file first and are renamed
    /// into place, so a reader never sees a half-written entry.
    pub fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ComponentError> {
        fs::create_dir_all(&self.root)?;
        let target = self.entry_path(key);
        let tmp = target.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    /// Returns whether an entry was present.
    pub fn remove(&self, key: &str) -> Result<bool, ComponentError> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub fn clear(&self) -> Result<(), ComponentError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
