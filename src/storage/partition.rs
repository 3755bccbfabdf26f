use std::fmt;
use std::path::PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::core::types::{Row, Value};

/// Partition identifier, allocated in strictly increasing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartitionId(pub u64);

impl PartitionId {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        PartitionId(self.0 + 1)
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// What a backend reports back after persisting a partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionHandle {
    pub id: PartitionId,
    pub path: Option<PathBuf>,
    pub row_count: usize,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// Partition file header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionHeader {
    pub magic: [u8; 4],
    pub version: u32,       // Format version
    pub row_count: u32,
    pub column_count: u32,
    pub checksum: u32,      // CRC32 of the compressed payload
    pub payload_size: u64,  // Uncompressed payload length
    pub compression: u8,
}

impl PartitionHeader {
    pub const MAGIC: [u8; 4] = *b"ZPT1";
    pub const VERSION: u32 = 1;
    pub const SIZE: usize = 29; // Fixed header size under bincode's default encoding

    pub fn new(row_count: u32, column_count: u32) -> Self {
        PartitionHeader {
            magic: Self::MAGIC,
            version: Self::VERSION,
            row_count,
            column_count,
            checksum: 0,
            payload_size: 0,
            compression: 0,
        }
    }
}

/// Column-major body of a partition file.
///
/// `columns` is the sorted union of every row's column names. Each entry of
/// `values` holds one cell per row; `None` marks a column the row never had.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnarPayload {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<Value>>>,
    pub row_count: usize,
}

impl ColumnarPayload {
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut columns: Vec<String> = rows
            .iter()
            .flat_map(|row| row.keys().cloned())
            .collect();
        columns.sort();
        columns.dedup();

        let values = columns
            .iter()
            .map(|col| rows.iter().map(|row| row.get(col).cloned()).collect())
            .collect();

        ColumnarPayload {
            columns,
            values,
            row_count: rows.len(),
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        let mut rows = vec![Row::new(); self.row_count];
        for (col, cells) in self.columns.into_iter().zip(self.values) {
            for (row, cell) in rows.iter_mut().zip(cells) {
                if let Some(value) = cell {
                    row.insert(col.clone(), value);
                }
            }
        }
        rows
    }
}
