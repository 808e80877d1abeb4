use std::{
    io,
    path::{Path, PathBuf},
};
#[cfg(test)]
use std::{collections::HashMap, sync::RwLock};

use crate::lock::FileLock;

/// Keyed blob storage. Every entry is read and written as a whole.
pub trait StorageManager: Send + Sync {
    fn write(&self, key: &str, data: &[u8]) -> io::Result<()>;
    fn read(&self, key: &str) -> io::Result<Vec<u8>>;
    fn exists(&self, key: &str) -> bool;

    /// Exclusive lock held across a read-modify-write cycle. Backends that
    /// are not shared between processes have nothing to lock.
    fn lock_exclusive(&self) -> io::Result<Option<FileLock>> {
        Ok(None)
    }
}

/// One file per key inside a directory.
#[derive(Clone)]
pub struct BackendLocal {
    pub base_dir: PathBuf,
}

impl BackendLocal {
    pub fn new(storage_dir: impl AsRef<Path>) -> io::Result<Self> {
        let path = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)?;
        Ok(BackendLocal { base_dir: path })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.base_dir.join(key)
    }
}

impl StorageManager for BackendLocal {
    fn exists(&self, key: &str) -> bool {
        self.path(key).is_file()
    }

    fn read(&self, key: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.path(key))
    }

    // write to a sibling temp file first so readers never see a partial entry
    fn write(&self, key: &str, data: &[u8]) -> io::Result<()> {
        let temp_path = self
            .base_dir
            .join(format!(".{}-{key}", rusty_ulid::generate_ulid_string()));

        std::fs::write(&temp_path, data)?;

        std::fs::rename(&temp_path, self.path(key))
    }

    fn lock_exclusive(&self) -> io::Result<Option<FileLock>> {
        FileLock::acquire_blocking(&self.base_dir).map(Some)
    }
}

/// Process-local storage, gone when dropped.
#[cfg(test)]
#[derive(Default)]
pub struct BackendMemory {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

#[cfg(test)]
impl BackendMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "memory storage lock poisoned")
}

#[cfg(test)]
impl StorageManager for BackendMemory {
    fn write(&self, key: &str, data: &[u8]) -> io::Result<()> {
        self.entries
            .write()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn read(&self, key: &str) -> io::Result<Vec<u8>> {
        self.entries
            .read()
            .map_err(|_| poisoned())?
            .get(key)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{key} not found")))
    }

    fn exists(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }
}
