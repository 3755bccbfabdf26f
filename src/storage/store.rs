use std::sync::Arc;
use log::debug;
use crate::cache::partition_cache::{CacheStats, PartitionCache};
use crate::core::error::Result;
use crate::core::types::{Row, Value};
use crate::index::zone_map::ZoneMapIndex;
use crate::storage::backend::PartitionBackend;
use crate::storage::partition::PartitionId;

/// Ordered set of live partitions plus their zone maps and cached contents.
///
/// Every successful write refreshes the zone map and the cache entry before
/// returning, so later reads never see stale data.
pub struct PartitionStore {
    backend: Box<dyn PartitionBackend>,
    zone_maps: ZoneMapIndex,
    cache: PartitionCache,
    partitions: Vec<PartitionId>,   // Creation order
    next_id: PartitionId,
    bytes_written: u64,
}

impl PartitionStore {
    pub fn new(backend: Box<dyn PartitionBackend>, zone_maps: ZoneMapIndex, cache: PartitionCache) -> Self {
        PartitionStore {
            backend,
            zone_maps,
            cache,
            partitions: Vec::new(),
            next_id: PartitionId(0),
            bytes_written: 0,
        }
    }

    /// Persist `rows` as a new partition under the next id
    pub fn create(&mut self, rows: &[Row]) -> Result<PartitionId> {
        let id = self.next_id;
        // Ids are never reused, even if this write fails
        self.next_id = id.next();

        let handle = self.backend.write(id, rows)?;
        self.bytes_written += handle.size_bytes;
        self.zone_maps.build(id, rows);
        self.cache.put(id, rows.to_vec());
        self.partitions.push(id);

        debug!("created partition {} with {} rows ({} bytes)", id, handle.row_count, handle.size_bytes);
        Ok(id)
    }

    pub fn read(&mut self, id: PartitionId) -> Result<Arc<Vec<Row>>> {
        let backend = &self.backend;
        self.cache.get_or_load(id, || backend.read(id))
    }

    /// Replace the contents of `id`; an empty `rows` deletes the partition
    pub fn rewrite(&mut self, id: PartitionId, rows: Vec<Row>) -> Result<()> {
        if rows.is_empty() {
            self.backend.delete(id)?;
            self.partitions.retain(|&p| p != id);
            self.zone_maps.remove(id);
            self.cache.invalidate(id);
            debug!("partition {} emptied and removed", id);
            return Ok(());
        }

        let handle = self.backend.write(id, &rows)?;
        self.bytes_written += handle.size_bytes;
        self.zone_maps.build(id, &rows);
        debug!("rewrote partition {} with {} rows ({} bytes)", id, handle.row_count, handle.size_bytes);
        self.cache.put(id, rows);
        Ok(())
    }

    /// Live partitions that survive zone-map pruning, in creation order
    pub fn candidates(&self, key_column: &str, keys: &[Value]) -> Vec<PartitionId> {
        self.zone_maps.candidates(&self.partitions, key_column, keys)
    }

    pub fn partition_ids(&self) -> &[PartitionId] {
        &self.partitions
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn row_count(&self, id: PartitionId) -> Option<usize> {
        self.zone_maps.row_count(id)
    }

    pub fn total_rows(&self) -> usize {
        self.partitions
            .iter()
            .filter_map(|&id| self.zone_maps.row_count(id))
            .sum()
    }

    /// Bytes handed to the backend across all creates and rewrites
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn zone_maps(&self) -> &ZoneMapIndex {
        &self.zone_maps
    }

    pub fn is_cached(&self, id: PartitionId) -> bool {
        self.cache.contains(id)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
