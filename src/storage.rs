//! Pluggable storage backends.
//!
//! All index files are written and read through the [`Storage`] trait so the
//! same write path runs against a directory on disk ([`file::FileStorage`])
//! or an in-memory map ([`memory::MemoryStorage`], used heavily in tests).

pub mod file;
pub mod memory;

use std::io::{Read, Seek, Write};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;

/// A writable stream created by a storage backend.
///
/// `close` flushes buffered bytes and makes them durable; callers must close
/// every output before the data is guaranteed visible to readers.
pub trait StorageOutput: Write + Send {
    fn close(&mut self) -> Result<()>;
}

/// A readable, seekable stream opened from a storage backend.
pub trait StorageInput: Read + Seek + Send {}

/// A storage backend owning a flat namespace of files.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Create (or truncate) a file and return a writer for it.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Open an existing file for reading.
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Check whether a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// List all file names in this storage.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Delete a file.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// Rename a file, replacing the destination if it exists.
    fn rename_file(&self, from: &str, to: &str) -> Result<()>;
}

/// Configuration selecting a storage backend.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// Files under a directory on the local filesystem.
    File(PathBuf),
    /// An in-memory map of files.
    Memory,
}

/// Factory for creating storage backends from a [`StorageConfig`].
pub struct StorageFactory;

impl StorageFactory {
    pub fn create(config: StorageConfig) -> Result<Arc<dyn Storage>> {
        match config {
            StorageConfig::File(path) => Ok(Arc::new(file::FileStorage::new(path)?)),
            StorageConfig::Memory => Ok(Arc::new(memory::MemoryStorage::new())),
        }
    }
}
