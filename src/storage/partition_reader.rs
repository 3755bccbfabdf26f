use std::fs::File;
use std::io::Read;
use crc32fast::Hasher;
use crate::compression::compress::{CompressedBlock, CompressionType};
use crate::core::error::{Error, Result};
use crate::core::types::Row;
use crate::storage::layout::StorageLayout;
use crate::storage::partition::{ColumnarPayload, PartitionHeader, PartitionId};

pub struct PartitionReader {
    pub partition_id: PartitionId,
    pub header: PartitionHeader,
    file: File,
}

impl PartitionReader {
    pub fn open(layout: &StorageLayout, partition_id: PartitionId) -> Result<Self> {
        let path = layout.partition_path(partition_id);
        let mut file = File::open(path)?;

        let mut header_buf = vec![0u8; PartitionHeader::SIZE];
        file.read_exact(&mut header_buf)
            .map_err(|_| Error::corrupted(format!("partition {} has a truncated header", partition_id)))?;
        let header: PartitionHeader = bincode::deserialize(&header_buf)?;

        if header.magic != PartitionHeader::MAGIC {
            return Err(Error::corrupted(format!("partition {} has a bad magic number", partition_id)));
        }
        if header.version != PartitionHeader::VERSION {
            return Err(Error::corrupted(format!(
                "partition {} has incompatible version {}",
                partition_id, header.version
            )));
        }

        Ok(PartitionReader {
            partition_id,
            header,
            file,
        })
    }

    /// Materialize every row of the partition
    pub fn read_rows(mut self) -> Result<Vec<Row>> {
        let mut data = Vec::new();
        self.file.read_to_end(&mut data)?;

        let mut hasher = Hasher::new();
        hasher.update(&data);
        if hasher.finalize() != self.header.checksum {
            return Err(Error::corrupted(format!("partition {} failed checksum", self.partition_id)));
        }

        let block = CompressedBlock {
            data,
            original_size: self.header.payload_size as usize,
            compression: CompressionType::from_u8(self.header.compression)?,
        };
        let payload: ColumnarPayload = bincode::deserialize(&block.decompress()?)?;

        if payload.row_count != self.header.row_count as usize {
            return Err(Error::corrupted(format!(
                "partition {} header says {} rows, payload has {}",
                self.partition_id, self.header.row_count, payload.row_count
            )));
        }

        Ok(payload.into_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, OpenOptions};
    use std::io::{Seek, SeekFrom, Write};
    use crate::core::error::ErrorKind;
    use crate::row;
    use crate::storage::partition_writer::PartitionWriter;

    fn sample_rows() -> Vec<Row> {
        vec![
            row! { "id" => "1", "name" => "alice", "score" => 9.5 },
            row! { "id" => "2", "name" => "bob" },
            row! { "id" => "10", "email" => "c@example.com", "active" => false },
        ]
    }

    #[test]
    fn written_partition_reads_back_for_every_codec() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path().join("s")).unwrap();

        for (n, codec) in [
            CompressionType::None,
            CompressionType::LZ4,
            CompressionType::Zstd,
            CompressionType::Snappy,
        ]
        .into_iter()
        .enumerate()
        {
            let id = PartitionId(n as u64);
            let handle = PartitionWriter::new(&layout, codec, false)
                .write(id, &sample_rows())
                .unwrap();
            assert_eq!(handle.row_count, 3);
            assert!(!layout.partition_tmp_path(id).exists());

            let rows = PartitionReader::open(&layout, id).unwrap().read_rows().unwrap();
            assert_eq!(rows, sample_rows());
        }
    }

    #[test]
    fn missing_partition_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path().join("s")).unwrap();
        let err = PartitionReader::open(&layout, PartitionId(99)).err().unwrap();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn flipped_payload_byte_fails_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path().join("s")).unwrap();
        let id = PartitionId(1);
        PartitionWriter::new(&layout, CompressionType::None, false)
            .write(id, &sample_rows())
            .unwrap();

        let path = layout.partition_path(id);
        let mut file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        file.seek(SeekFrom::Start(PartitionHeader::SIZE as u64 + 2)).unwrap();
        file.write_all(&[0xFF]).unwrap();
        drop(file);

        let err = PartitionReader::open(&layout, id).unwrap().read_rows().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Corrupted);
    }

    #[test]
    fn garbage_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path().join("s")).unwrap();
        fs::write(layout.partition_path(PartitionId(3)), b"not a partition at all, no no").unwrap();
        let err = PartitionReader::open(&layout, PartitionId(3)).err().unwrap();
        assert_eq!(err.kind, ErrorKind::Corrupted);
    }
}
