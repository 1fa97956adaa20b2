//! Block-addressed record storage.
//!
//! Every index file is a stream of independently serialized records. A
//! [`writer::BlockWriter`] appends one record at a time and returns the
//! [`BlockInfo`] address of what was just appended; a
//! [`reader::BlockReader`] re-reads records given an ordered sequence of
//! those addresses, moving only forward through the stream.
//!
//! Record encodings are pluggable through [`BlockCodec`]: [`JsonCodec`]
//! covers any serde type, while [`BlockInfoCodec`] and [`DocHashCodec`]
//! provide fixed-width binary layouts for the address and primary-key files
//! so those can also be scanned sequentially without an address index.

pub mod reader;
pub mod writer;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::data::DocHash;
use crate::error::{Result, SylvaError};

/// The address of one serialized record inside a stream.
///
/// Addresses returned by a writer for a given stream are strictly increasing
/// in position and non-overlapping, in write order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Byte offset of the record from the start of the stream.
    pub position: u64,
    /// Length of the record in bytes.
    pub length: u64,
}

impl BlockInfo {
    pub fn new(position: u64, length: u64) -> Self {
        Self { position, length }
    }

    /// The first byte position past the end of this record.
    pub fn end(&self) -> u64 {
        self.position + self.length
    }
}

/// Encodes and decodes one record type to and from bytes.
pub trait BlockCodec<T>: Send + Sync {
    fn encode(&self, record: &T) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<T>;
}

/// JSON codec for any serde-serializable record type.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl<T: Serialize + DeserializeOwned> BlockCodec<T> for JsonCodec {
    fn encode(&self, record: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(record)
            .map_err(|e| SylvaError::serialization(format!("failed to encode record: {e}")))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes)
            .map_err(|e| SylvaError::serialization(format!("failed to decode record: {e}")))
    }
}

/// Fixed-width codec for [`BlockInfo`] records: two little-endian u64s.
///
/// Address files written with this codec can be scanned sequentially with
/// plain position arithmetic (16 bytes per record).
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockInfoCodec;

/// Serialized size of one [`BlockInfo`] record.
pub const BLOCK_INFO_SIZE: u64 = 16;

impl BlockCodec<BlockInfo> for BlockInfoCodec {
    fn encode(&self, record: &BlockInfo) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; BLOCK_INFO_SIZE as usize];
        LittleEndian::write_u64(&mut buf[0..8], record.position);
        LittleEndian::write_u64(&mut buf[8..16], record.length);
        Ok(buf)
    }

    fn decode(&self, bytes: &[u8]) -> Result<BlockInfo> {
        if bytes.len() != BLOCK_INFO_SIZE as usize {
            return Err(SylvaError::serialization(format!(
                "block address record must be {BLOCK_INFO_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(BlockInfo {
            position: LittleEndian::read_u64(&bytes[0..8]),
            length: LittleEndian::read_u64(&bytes[8..16]),
        })
    }
}

/// Fixed-width codec for [`DocHash`] records: one little-endian u64.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocHashCodec;

/// Serialized size of one [`DocHash`] record.
pub const DOC_HASH_SIZE: u64 = 8;

impl BlockCodec<DocHash> for DocHashCodec {
    fn encode(&self, record: &DocHash) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; DOC_HASH_SIZE as usize];
        LittleEndian::write_u64(&mut buf, record.0);
        Ok(buf)
    }

    fn decode(&self, bytes: &[u8]) -> Result<DocHash> {
        if bytes.len() != DOC_HASH_SIZE as usize {
            return Err(SylvaError::serialization(format!(
                "primary-key record must be {DOC_HASH_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(DocHash(LittleEndian::read_u64(bytes)))
    }
}
