//! Sequential block writer.

use std::io::Write;
use std::sync::Arc;

use crate::block::{BlockCodec, BlockInfo};
use crate::error::Result;
use crate::storage::StorageOutput;

/// Appends serialized records to an output stream, returning the address of
/// each record as it is written.
///
/// A writer must own its stream exclusively: the position bookkeeping assumes
/// no other writer appends to the same stream. Concurrency across files is
/// achieved by giving every file its own writer.
pub struct BlockWriter<T> {
    output: Box<dyn StorageOutput>,
    codec: Arc<dyn BlockCodec<T>>,
    position: u64,
    records: u64,
}

impl<T> BlockWriter<T> {
    /// Create a writer over a freshly created output stream.
    pub fn new(output: Box<dyn StorageOutput>, codec: Arc<dyn BlockCodec<T>>) -> Self {
        Self {
            output,
            codec,
            position: 0,
            records: 0,
        }
    }

    /// Serialize `record`, append it to the stream, and return its address.
    pub fn write(&mut self, record: &T) -> Result<BlockInfo> {
        let bytes = self.codec.encode(record)?;
        self.output.write_all(&bytes)?;

        let info = BlockInfo::new(self.position, bytes.len() as u64);
        self.position = info.end();
        self.records += 1;
        Ok(info)
    }

    /// Number of records written so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Current write position (equal to the total bytes written).
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Flush and close the underlying stream.
    pub fn close(mut self) -> Result<()> {
        self.output.close()
    }
}

impl<T> std::fmt::Debug for BlockWriter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockWriter")
            .field("position", &self.position)
            .field("records", &self.records)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::JsonCodec;
    use crate::storage::Storage;
    use crate::storage::memory::MemoryStorage;

    #[test]
    fn test_addresses_are_contiguous() -> Result<()> {
        let storage = MemoryStorage::new();
        let output = storage.create_output("records")?;
        let mut writer: BlockWriter<String> = BlockWriter::new(output, Arc::new(JsonCodec));

        let a = writer.write(&"first".to_string())?;
        let b = writer.write(&"second record".to_string())?;
        let c = writer.write(&"third".to_string())?;

        assert_eq!(a.position, 0);
        assert_eq!(a.end(), b.position);
        assert_eq!(b.end(), c.position);
        assert_eq!(writer.records(), 3);
        assert_eq!(writer.position(), c.end());
        writer.close()?;
        Ok(())
    }
}
