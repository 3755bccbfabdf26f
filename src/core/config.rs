use std::fs;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use crate::compression::compress::CompressionType;
use crate::core::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage_path: PathBuf,
    pub partition_size: usize,                  // Rows per partition
    pub cache_capacity: usize,                  // Materialized partitions kept in memory

    // Columns whose pruning key is zero-padded to sort numerically
    pub identifier_columns: Vec<String>,
    pub identifier_pad_width: usize,

    pub compression: CompressionType,
    pub sync_writes: bool,                      // fsync partition files after write
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_path: PathBuf::from("./warehouse_data"),
            partition_size: 1000,
            cache_capacity: 3,
            identifier_columns: vec!["id".to_string()],
            identifier_pad_width: 20,                   // u64::MAX has 20 digits
            compression: CompressionType::LZ4,
            sync_writes: true,
        }
    }
}

impl Config {
    pub fn new(partition_size: usize, storage_path: impl Into<PathBuf>) -> Self {
        Config {
            storage_path: storage_path.into(),
            partition_size,
            ..Config::default()
        }
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_identifier_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifier_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_identifier_pad_width(mut self, width: usize) -> Self {
        self.identifier_pad_width = width;
        self
    }

    pub fn with_compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.partition_size == 0 {
            return Err(Error::invalid_config("partition_size must be greater than 0"));
        }
        if self.cache_capacity == 0 {
            return Err(Error::invalid_config("cache_capacity must be greater than 0"));
        }
        if self.identifier_pad_width == 0 {
            return Err(Error::invalid_config("identifier_pad_width must be greater than 0"));
        }
        Ok(())
    }

    /// Load a config from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }
}
