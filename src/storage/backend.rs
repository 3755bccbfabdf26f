use std::collections::HashMap;
use std::fs;
use std::path::Path;
use chrono::Utc;
use log::debug;
use crate::compression::compress::CompressionType;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::Row;
use crate::storage::layout::StorageLayout;
use crate::storage::partition::{PartitionHandle, PartitionId};
use crate::storage::partition_reader::PartitionReader;
use crate::storage::partition_writer::PartitionWriter;

/// Persistence capability for partitions.
///
/// Implementations must round-trip rows with differing column sets exactly.
pub trait PartitionBackend {
    fn write(&mut self, id: PartitionId, rows: &[Row]) -> Result<PartitionHandle>;
    fn read(&self, id: PartitionId) -> Result<Vec<Row>>;
    fn delete(&mut self, id: PartitionId) -> Result<()>;
}

/// One compressed columnar file per partition
pub struct FileBackend {
    layout: StorageLayout,
    compression: CompressionType,
    sync: bool,
}

impl FileBackend {
    /// Opens a fresh backend under `base_dir`, wiping whatever was there
    pub fn open(base_dir: impl AsRef<Path>, compression: CompressionType, sync: bool) -> Result<Self> {
        Ok(FileBackend {
            layout: StorageLayout::new(base_dir)?,
            compression,
            sync,
        })
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }
}

impl PartitionBackend for FileBackend {
    fn write(&mut self, id: PartitionId, rows: &[Row]) -> Result<PartitionHandle> {
        PartitionWriter::new(&self.layout, self.compression, self.sync).write(id, rows)
    }

    fn read(&self, id: PartitionId) -> Result<Vec<Row>> {
        PartitionReader::open(&self.layout, id)?.read_rows()
    }

    fn delete(&mut self, id: PartitionId) -> Result<()> {
        let path = self.layout.partition_path(id);
        fs::remove_file(&path)?;
        debug!("deleted partition file {}", path.display());
        Ok(())
    }
}

/// Keeps partitions in a map; nothing touches the filesystem
#[derive(Debug, Default)]
pub struct MemoryBackend {
    partitions: HashMap<PartitionId, Vec<Row>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend::default()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

impl PartitionBackend for MemoryBackend {
    fn write(&mut self, id: PartitionId, rows: &[Row]) -> Result<PartitionHandle> {
        self.partitions.insert(id, rows.to_vec());
        Ok(PartitionHandle {
            id,
            path: None,
            row_count: rows.len(),
            size_bytes: 0,
            created_at: Utc::now(),
        })
    }

    fn read(&self, id: PartitionId) -> Result<Vec<Row>> {
        self.partitions
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("partition {} does not exist", id)))
    }

    fn delete(&mut self, id: PartitionId) -> Result<()> {
        self.partitions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("partition {} does not exist", id)))
    }
}
