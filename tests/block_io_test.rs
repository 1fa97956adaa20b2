use std::sync::Arc;

use sylva::{
    BlockInfo, BlockReader, BlockWriter, Document, JsonCodec, Result, Storage, StorageConfig,
    StorageFactory, SylvaError,
};

fn write_documents(storage: &Arc<dyn Storage>, count: usize) -> Result<Vec<BlockInfo>> {
    let output = storage.create_output("docs")?;
    let mut writer: BlockWriter<Document> = BlockWriter::new(output, Arc::new(JsonCodec));
    let mut addresses = Vec::new();
    for i in 0..count {
        let doc = Document::with_id(format!("doc{i}")).field("n", i.to_string());
        addresses.push(writer.write(&doc)?);
    }
    writer.close()?;
    Ok(addresses)
}

#[test]
fn test_addresses_tile_the_stream() -> Result<()> {
    let storage = StorageFactory::create(StorageConfig::Memory)?;
    let addresses = write_documents(&storage, 20)?;

    assert_eq!(addresses[0].position, 0);
    for pair in addresses.windows(2) {
        assert_eq!(pair[0].position + pair[0].length, pair[1].position);
    }
    Ok(())
}

#[test]
fn test_round_trip_reproduces_records() -> Result<()> {
    let storage = StorageFactory::create(StorageConfig::Memory)?;
    let addresses = write_documents(&storage, 20)?;

    let input = storage.open_input("docs")?;
    let mut reader: BlockReader<Document> = BlockReader::new(input, Arc::new(JsonCodec));
    let docs: Result<Vec<Document>> = reader.get(addresses).collect();
    let docs = docs?;

    assert_eq!(docs.len(), 20);
    for (i, doc) in docs.iter().enumerate() {
        assert_eq!(doc.id.as_deref(), Some(format!("doc{i}").as_str()));
        assert_eq!(doc.get("n"), Some(i.to_string().as_str()));
    }
    Ok(())
}

#[test]
fn test_sparse_forward_reads() -> Result<()> {
    let storage = StorageFactory::create(StorageConfig::Memory)?;
    let addresses = write_documents(&storage, 20)?;

    // Read every third record; positions only ever move forward.
    let sparse: Vec<BlockInfo> = addresses.iter().step_by(3).copied().collect();
    let input = storage.open_input("docs")?;
    let mut reader: BlockReader<Document> = BlockReader::new(input, Arc::new(JsonCodec));
    let docs: Result<Vec<Document>> = reader.get(sparse.clone()).collect();
    assert_eq!(docs?.len(), sparse.len());
    assert_eq!(reader.position(), sparse.last().unwrap().position + sparse.last().unwrap().length);
    Ok(())
}

#[test]
fn test_decreasing_addresses_are_rejected() -> Result<()> {
    let storage = StorageFactory::create(StorageConfig::Memory)?;
    let addresses = write_documents(&storage, 2)?;

    let input = storage.open_input("docs")?;
    let mut reader: BlockReader<Document> = BlockReader::new(input, Arc::new(JsonCodec));

    let backward = vec![addresses[1], addresses[0]];
    let results: Vec<Result<Document>> = reader.get(backward).collect();
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(SylvaError::InvalidArgument(_))));
    Ok(())
}

#[test]
fn test_adjacent_reads_consume_exactly_the_stream() -> Result<()> {
    let storage = StorageFactory::create(StorageConfig::Memory)?;

    // Two raw byte records of known sizes: (0, 10) then (10, 5).
    let output = storage.create_output("raw")?;
    let mut writer: BlockWriter<Vec<u8>> = BlockWriter::new(output, Arc::new(ByteCodec));
    let a = writer.write(&vec![1u8; 10])?;
    let b = writer.write(&vec![2u8; 5])?;
    writer.close()?;
    assert_eq!((a.position, a.length), (0, 10));
    assert_eq!((b.position, b.length), (10, 5));

    let input = storage.open_input("raw")?;
    let mut reader: BlockReader<Vec<u8>> = BlockReader::new(input, Arc::new(ByteCodec));
    let records: Result<Vec<Vec<u8>>> = reader.get(vec![a, b]).collect();
    let records = records?;
    assert_eq!(records[0], vec![1u8; 10]);
    assert_eq!(records[1], vec![2u8; 5]);
    assert_eq!(reader.position(), 15);
    Ok(())
}

/// Identity codec: the record bytes are the block bytes.
struct ByteCodec;

impl sylva::BlockCodec<Vec<u8>> for ByteCodec {
    fn encode(&self, record: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(record.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}
