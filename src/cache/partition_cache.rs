use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use log::debug;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};
use crate::core::types::Row;
use crate::storage::partition::PartitionId;

/// LRU cache of materialized partition contents
pub struct PartitionCache {
    cache: LruCache<PartitionId, Arc<Vec<Row>>>,
    capacity: usize,
    hit_count: usize,
    miss_count: usize,
    eviction_count: usize,
}

impl PartitionCache {
    pub fn new(capacity: usize) -> Result<Self> {
        let cap = NonZeroUsize::new(capacity)
            .ok_or_else(|| Error::invalid_config("cache capacity must be greater than 0"))?;
        Ok(PartitionCache {
            cache: LruCache::new(cap),
            capacity,
            hit_count: 0,
            miss_count: 0,
            eviction_count: 0,
        })
    }

    /// Look up a partition, marking it most recently used
    pub fn get(&mut self, id: PartitionId) -> Option<Arc<Vec<Row>>> {
        if let Some(rows) = self.cache.get(&id) {
            self.hit_count += 1;
            Some(rows.clone())
        } else {
            self.miss_count += 1;
            None
        }
    }

    /// Return the cached rows or load them with `loader`.
    ///
    /// A failing loader leaves the cache untouched.
    pub fn get_or_load<F>(&mut self, id: PartitionId, loader: F) -> Result<Arc<Vec<Row>>>
    where
        F: FnOnce() -> Result<Vec<Row>>,
    {
        if let Some(rows) = self.get(id) {
            return Ok(rows);
        }
        let rows = loader()?;
        Ok(self.put(id, rows))
    }

    /// Insert or replace an entry; evicts the least recently used one on overflow
    pub fn put(&mut self, id: PartitionId, rows: Vec<Row>) -> Arc<Vec<Row>> {
        let rows = Arc::new(rows);
        if let Some((evicted, _)) = self.cache.push(id, rows.clone()) {
            if evicted != id {
                self.eviction_count += 1;
                debug!("evicted partition {} from cache", evicted);
            }
        }
        rows
    }

    pub fn invalidate(&mut self, id: PartitionId) {
        self.cache.pop(&id);
    }

    /// Membership check that does not touch recency
    pub fn contains(&self, id: PartitionId) -> bool {
        self.cache.contains(&id)
    }

    /// Cached ids, most recently used first
    pub fn ids_by_recency(&self) -> Vec<PartitionId> {
        self.cache.iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count,
            miss_count: self.miss_count,
            eviction_count: self.eviction_count,
            size: self.cache.len(),
            capacity: self.capacity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub hit_count: usize,
    pub miss_count: usize,
    pub eviction_count: usize,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}
