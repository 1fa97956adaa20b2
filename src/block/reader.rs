//! Forward-only block reader.

use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use crate::block::{BlockCodec, BlockInfo};
use crate::error::{Result, SylvaError};
use crate::storage::StorageInput;

/// Random-access reader over a stream of independently serialized records.
///
/// Given an ordered sequence of [`BlockInfo`] addresses, the reader advances
/// the stream forward to each record, reads exactly its length, and decodes
/// it through the configured codec. The address sequence must be
/// non-decreasing in position: backward movement is a precondition violation
/// and fails rather than being silently reordered. Callers needing
/// out-of-order access must sort addresses first or use independent reader
/// instances.
pub struct BlockReader<T> {
    input: Box<dyn StorageInput>,
    codec: Arc<dyn BlockCodec<T>>,
    position: u64,
}

impl<T> BlockReader<T> {
    /// Create a reader over a stream positioned at its start.
    pub fn new(input: Box<dyn StorageInput>, codec: Arc<dyn BlockCodec<T>>) -> Self {
        Self {
            input,
            codec,
            position: 0,
        }
    }

    /// Read and decode the record at `address`.
    ///
    /// Fails if `address.position` is behind the current stream position.
    pub fn read_at(&mut self, address: BlockInfo) -> Result<T> {
        if address.position < self.position {
            return Err(SylvaError::invalid_argument(format!(
                "block address sequence moved backward: at {}, requested {}",
                self.position, address.position
            )));
        }
        if address.position > self.position {
            self.input.seek(SeekFrom::Start(address.position))?;
        }

        let mut buf = vec![0u8; address.length as usize];
        self.input.read_exact(&mut buf)?;
        self.position = address.end();
        self.codec.decode(&buf)
    }

    /// Lazily read the records at the given addresses, in order.
    ///
    /// Decoding failures and backward addresses surface as errors on the
    /// offending item; no partial record is ever yielded.
    pub fn get<'a, I>(&'a mut self, addresses: I) -> impl Iterator<Item = Result<T>> + 'a
    where
        I: IntoIterator<Item = BlockInfo>,
        I::IntoIter: 'a,
    {
        addresses.into_iter().map(move |address| self.read_at(address))
    }

    /// Current stream position (end of the last record read).
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Release the underlying stream without consuming it further.
    pub fn into_inner(self) -> Box<dyn StorageInput> {
        self.input
    }
}

impl<T> std::fmt::Debug for BlockReader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockReader")
            .field("position", &self.position)
            .finish()
    }
}
