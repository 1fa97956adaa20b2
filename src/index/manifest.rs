//! Generation manifests.
//!
//! A generation's manifest (`<version>.ix`) is written last, after every
//! other file of the generation has been flushed and closed. Its presence is
//! the authoritative signal that the generation is complete and safe to
//! read; a generation without a manifest must be treated as not committed.

use std::io::{Read, Write};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SylvaError};
use crate::index::Compression;
use crate::storage::Storage;

/// Per-generation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IxInfo {
    /// The generation's version id.
    pub version: u64,
    /// Number of distinct documents accepted by the commit.
    pub doc_count: u64,
    /// Compression applied to stored document bytes.
    pub compression: Compression,
}

impl IxInfo {
    /// The manifest file name for a version.
    pub fn file_name(version: u64) -> String {
        format!("{version}.ix")
    }

    /// Atomically publish the manifest: write to a temporary file, flush,
    /// then rename into place.
    pub fn write(&self, storage: &Arc<dyn Storage>) -> Result<()> {
        let name = Self::file_name(self.version);
        let tmp_name = format!("{name}.tmp");

        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| SylvaError::serialization(format!("failed to encode manifest: {e}")))?;

        let mut output = storage.create_output(&tmp_name)?;
        output.write_all(&json)?;
        output.close()?;

        storage.rename_file(&tmp_name, &name)?;
        Ok(())
    }

    /// Read the manifest of a committed generation.
    pub fn read(storage: &Arc<dyn Storage>, version: u64) -> Result<Self> {
        let mut input = storage.open_input(&Self::file_name(version))?;
        let mut json = Vec::new();
        input.read_to_end(&mut json)?;
        serde_json::from_slice(&json)
            .map_err(|e| SylvaError::serialization(format!("failed to decode manifest: {e}")))
    }
}

/// List the version ids of all committed generations, oldest first.
///
/// Only generations with a manifest count; partially written generations are
/// invisible here by design.
pub fn versions(storage: &Arc<dyn Storage>) -> Result<Vec<u64>> {
    let mut versions: Vec<u64> = storage
        .list_files()?
        .into_iter()
        .filter_map(|name| {
            name.strip_suffix(".ix")
                .and_then(|stem| stem.parse::<u64>().ok())
        })
        .collect();
    versions.sort_unstable();
    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    #[test]
    fn test_manifest_roundtrip() -> Result<()> {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let info = IxInfo {
            version: 42,
            doc_count: 7,
            compression: Compression::None,
        };
        info.write(&storage)?;

        assert!(storage.file_exists("42.ix"));
        assert!(!storage.file_exists("42.ix.tmp"));
        assert_eq!(IxInfo::read(&storage, 42)?, info);
        Ok(())
    }

    #[test]
    fn test_versions_ignores_incomplete_generations() -> Result<()> {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        for version in [3u64, 1, 2] {
            IxInfo {
                version,
                doc_count: 0,
                compression: Compression::None,
            }
            .write(&storage)?;
        }
        // A generation with data files but no manifest is not committed.
        storage.create_output("9.doc")?.close()?;

        assert_eq!(versions(&storage)?, vec![1, 2, 3]);
        Ok(())
    }
}
