//! In-memory storage backend.
//!
//! Primarily used by tests; behaves like [`file::FileStorage`](super::file)
//! with the close-to-publish rule: bytes written to an output become visible
//! to readers when the output is closed (or flushed).

use std::io::{Cursor, Write};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::error::{Result, SylvaError};
use crate::storage::{Storage, StorageInput, StorageOutput};

type FileMap = Arc<RwLock<AHashMap<String, Arc<Vec<u8>>>>>;

/// Storage backend keeping all files in an in-memory map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: FileMap,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        // Truncate semantics: publish an empty file immediately.
        self.files
            .write()
            .insert(name.to_string(), Arc::new(Vec::new()));
        Ok(Box::new(MemoryOutput {
            files: self.files.clone(),
            name: name.to_string(),
            buffer: Vec::new(),
        }))
    }

    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        let data = self
            .files
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| SylvaError::storage(format!("no such file: {name}")))?;
        Ok(Box::new(MemoryInput {
            cursor: Cursor::new(data.as_ref().clone()),
        }))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.files.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.files
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| SylvaError::storage(format!("no such file: {name}")))
    }

    fn rename_file(&self, from: &str, to: &str) -> Result<()> {
        let mut files = self.files.write();
        let data = files
            .remove(from)
            .ok_or_else(|| SylvaError::storage(format!("no such file: {from}")))?;
        files.insert(to.to_string(), data);
        Ok(())
    }
}

struct MemoryOutput {
    files: FileMap,
    name: String,
    buffer: Vec<u8>,
}

impl MemoryOutput {
    fn publish(&self) {
        self.files
            .write()
            .insert(self.name.clone(), Arc::new(self.buffer.clone()));
    }
}

impl Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.publish();
        Ok(())
    }
}

impl StorageOutput for MemoryOutput {
    fn close(&mut self) -> Result<()> {
        self.publish();
        Ok(())
    }
}

struct MemoryInput {
    cursor: Cursor<Vec<u8>>,
}

impl std::io::Read for MemoryInput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        std::io::Read::read(&mut self.cursor, buf)
    }
}

impl std::io::Seek for MemoryInput {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        std::io::Seek::seek(&mut self.cursor, pos)
    }
}

impl StorageInput for MemoryInput {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_close_publishes() -> Result<()> {
        let storage = MemoryStorage::new();
        let mut out = storage.create_output("f")?;
        out.write_all(b"abc")?;

        // Not yet closed: readers see the truncated (empty) file.
        let mut input = storage.open_input("f")?;
        let mut buf = Vec::new();
        input.read_to_end(&mut buf)?;
        assert!(buf.is_empty());

        out.close()?;
        let mut input = storage.open_input("f")?;
        let mut buf = Vec::new();
        input.read_to_end(&mut buf)?;
        assert_eq!(buf, b"abc");
        Ok(())
    }

    #[test]
    fn test_missing_file_errors() {
        let storage = MemoryStorage::new();
        assert!(storage.open_input("missing").is_err());
        assert!(storage.delete_file("missing").is_err());
    }
}
