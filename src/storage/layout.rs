use std::path::{Path, PathBuf};
use std::fs;
use log::info;
use crate::core::error::Result;
use crate::storage::partition::PartitionId;

/// Directory structure for partition files
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,          // Root directory
    pub partitions_dir: PathBuf,    // Partition data files (.zpt)
}

impl StorageLayout {
    /// Prepare `base_dir` for a fresh warehouse. Anything already there is removed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        if base_dir.exists() {
            info!("wiping existing storage at {}", base_dir.display());
            fs::remove_dir_all(&base_dir)?;
        }

        let partitions_dir = base_dir.join("partitions");
        fs::create_dir_all(&partitions_dir)?;

        Ok(StorageLayout {
            base_dir,
            partitions_dir,
        })
    }

    pub fn partition_path(&self, id: PartitionId) -> PathBuf {
        self.partitions_dir.join(format!("part_{:08}.zpt", id.0))
    }

    /// Staging path used while a partition is being (re)written
    pub fn partition_tmp_path(&self, id: PartitionId) -> PathBuf {
        self.partitions_dir.join(format!("part_{:08}.zpt.tmp", id.0))
    }
}
