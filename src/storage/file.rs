//! Local filesystem storage backend.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SylvaError};
use crate::storage::{Storage, StorageInput, StorageOutput};

/// Storage backend rooted at a directory on the local filesystem.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        // Storage names are a flat namespace; reject path traversal.
        if name.contains('/') || name.contains('\\') || name == ".." {
            return Err(SylvaError::invalid_argument(format!(
                "invalid storage file name: {name}"
            )));
        }
        Ok(self.dir.join(name))
    }

    /// The directory this storage is rooted at.
    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl Storage for FileStorage {
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        let path = self.resolve(name)?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        Ok(Box::new(FileOutput {
            writer: Some(BufWriter::new(file)),
        }))
    }

    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        let path = self.resolve(name)?;
        let file = File::open(&path)
            .map_err(|e| SylvaError::storage(format!("cannot open {name}: {e}")))?;
        Ok(Box::new(FileInput { file }))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.resolve(name).map(|p| p.exists()).unwrap_or(false)
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file()
                && let Some(name) = entry.file_name().to_str()
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        fs::remove_file(self.resolve(name)?)?;
        Ok(())
    }

    fn rename_file(&self, from: &str, to: &str) -> Result<()> {
        fs::rename(self.resolve(from)?, self.resolve(to)?)?;
        Ok(())
    }
}

struct FileOutput {
    writer: Option<BufWriter<File>>,
}

impl Write for FileOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.writer {
            Some(w) => w.write(buf),
            None => Err(std::io::Error::other("output is closed")),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.writer {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

impl StorageOutput for FileOutput {
    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        Ok(())
    }
}

struct FileInput {
    file: File,
}

impl std::io::Read for FileInput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.file.read(buf)
    }
}

impl std::io::Seek for FileInput {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        self.file.seek(pos)
    }
}

impl StorageInput for FileInput {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_write_read() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path())?;

        let mut out = storage.create_output("a.bin")?;
        out.write_all(b"hello")?;
        out.close()?;

        assert!(storage.file_exists("a.bin"));
        let mut input = storage.open_input("a.bin")?;
        let mut buf = Vec::new();
        input.read_to_end(&mut buf)?;
        assert_eq!(buf, b"hello");
        Ok(())
    }

    #[test]
    fn test_rejects_path_traversal() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path())?;
        assert!(storage.create_output("../evil").is_err());
        Ok(())
    }

    #[test]
    fn test_rename_replaces() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path())?;

        let mut out = storage.create_output("x.tmp")?;
        out.write_all(b"new")?;
        out.close()?;
        storage.rename_file("x.tmp", "x")?;

        assert!(!storage.file_exists("x.tmp"));
        assert!(storage.file_exists("x"));
        Ok(())
    }
}
