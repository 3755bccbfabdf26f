use serde::{Serialize, Deserialize};
use crate::cache::partition_cache::CacheStats;

/// Warehouse statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseStats {
    // Storage metrics
    pub partition_count: usize,
    pub partition_rows: usize,
    pub buffered_rows: usize,
    pub zone_map_entries: usize,
    pub bytes_written: u64,

    pub cache_stats: CacheStats,

    // Scan metrics
    pub flush_count: u64,
    pub partitions_scanned: u64,
    pub partitions_pruned: u64,
}

impl WarehouseStats {
    pub fn total_rows(&self) -> usize {
        self.partition_rows + self.buffered_rows
    }

    /// Fraction of partitions skipped by zone maps across all keyed operations
    pub fn prune_ratio(&self) -> f64 {
        let total = self.partitions_scanned + self.partitions_pruned;
        if total == 0 {
            0.0
        } else {
            self.partitions_pruned as f64 / total as f64
        }
    }
}
