use std::fs::{self, File};
use std::io::Write;
use chrono::Utc;
use crc32fast::Hasher;
use log::debug;
use crate::compression::compress::{CompressedBlock, CompressionType};
use crate::core::error::Result;
use crate::core::types::Row;
use crate::storage::layout::StorageLayout;
use crate::storage::partition::{ColumnarPayload, PartitionHandle, PartitionHeader, PartitionId};

pub struct PartitionWriter<'a> {
    layout: &'a StorageLayout,
    compression: CompressionType,
    sync: bool,
}

impl<'a> PartitionWriter<'a> {
    pub fn new(layout: &'a StorageLayout, compression: CompressionType, sync: bool) -> Self {
        PartitionWriter {
            layout,
            compression,
            sync,
        }
    }

    // [ HEADER (magic, version, counts, checksum, sizes) ] <- byte 0
    // [ COMPRESSED COLUMNAR PAYLOAD ]
    //
    // Written to a staging file and renamed over the previous version.
    pub fn write(&self, id: PartitionId, rows: &[Row]) -> Result<PartitionHandle> {
        let payload = ColumnarPayload::from_rows(rows);
        let column_count = payload.columns.len() as u32;

        let raw = bincode::serialize(&payload)?;
        let block = CompressedBlock::compress(&raw, self.compression)?;

        let mut hasher = Hasher::new();
        hasher.update(&block.data);

        let mut header = PartitionHeader::new(rows.len() as u32, column_count);
        header.checksum = hasher.finalize();
        header.payload_size = raw.len() as u64;
        header.compression = self.compression.as_u8();
        let header_data = bincode::serialize(&header)?;

        let tmp_path = self.layout.partition_tmp_path(id);
        let path = self.layout.partition_path(id);
        let written = (|| -> Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&header_data)?;
            file.write_all(&block.data)?;
            if self.sync {
                file.sync_all()?;
            }
            drop(file);
            fs::rename(&tmp_path, &path)?;
            Ok(())
        })();
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(err);
        }

        let size_bytes = (header_data.len() + block.data.len()) as u64;
        debug!(
            "wrote partition {} ({} rows, {} columns, {} bytes)",
            id, rows.len(), column_count, size_bytes
        );

        Ok(PartitionHandle {
            id,
            path: Some(path),
            row_count: rows.len(),
            size_bytes,
            created_at: Utc::now(),
        })
    }
}
