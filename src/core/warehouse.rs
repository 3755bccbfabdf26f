use std::collections::HashSet;
use std::slice;
use log::{debug, info};
use crate::cache::partition_cache::PartitionCache;
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::WarehouseStats;
use crate::core::types::{Row, Value};
use crate::index::zone_map::ZoneMapIndex;
use crate::storage::backend::{FileBackend, PartitionBackend};
use crate::storage::partition::PartitionId;
use crate::storage::store::PartitionStore;
use crate::writer::buffer::InsertBuffer;

/// Key-based CRUD over a collection of rows
pub trait DataWarehouse {
    /// Add a row
    fn add_data(&mut self, row: Row) -> Result<()>;

    /// Apply `patch` to the rows whose `key_column` equals `key_value`.
    /// Returns how many rows were patched.
    fn update_data(&mut self, key_column: &str, key_value: &Value, patch: &Row) -> Result<usize>;

    /// Remove the rows whose `key_column` equals `key_value`.
    /// Returns how many rows were removed.
    fn delete_data(&mut self, key_column: &str, key_value: &Value) -> Result<usize>;

    /// All rows whose `key_column` is one of `keys`
    fn query_data(&mut self, key_column: &str, keys: &[Value]) -> Result<Vec<Row>>;
}

/// Partitioned row store with insert buffering and zone-map pruning.
///
/// Update, delete and query flush the insert buffer first, so every row
/// added before the call is visible to it. Update and delete stop at the
/// first partition that holds a matching row; duplicates of the same key in
/// later partitions are left untouched.
pub struct Warehouse {
    config: Config,
    store: PartitionStore,
    buffer: InsertBuffer,
    flush_count: u64,
    partitions_scanned: u64,
    partitions_pruned: u64,
}

impl Warehouse {
    /// Create a warehouse with default settings; `storage_dir` is wiped
    pub fn new(partition_size: usize, storage_dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        Self::open(Config::new(partition_size, storage_dir))
    }

    /// Create a file-backed warehouse; prior contents of the storage path are wiped
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let backend = FileBackend::open(&config.storage_path, config.compression, config.sync_writes)?;
        info!(
            "opened warehouse at {} (partition_size={}, cache_capacity={})",
            config.storage_path.display(),
            config.partition_size,
            config.cache_capacity
        );
        Self::with_backend(config, Box::new(backend))
    }

    pub fn with_backend(config: Config, backend: Box<dyn PartitionBackend>) -> Result<Self> {
        config.validate()?;

        let zone_maps = ZoneMapIndex::new(
            config.identifier_columns.iter().cloned(),
            config.identifier_pad_width,
        );
        let cache = PartitionCache::new(config.cache_capacity)?;
        let buffer = InsertBuffer::new(config.partition_size);

        Ok(Warehouse {
            store: PartitionStore::new(backend, zone_maps, cache),
            buffer,
            config,
            flush_count: 0,
            partitions_scanned: 0,
            partitions_pruned: 0,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Move every buffered row into one new partition. No-op when empty.
    pub fn flush(&mut self) -> Result<Option<PartitionId>> {
        if self.buffer.is_empty() {
            return Ok(None);
        }
        let id = self.store.create(self.buffer.rows())?;
        debug!("flushed {} buffered rows into partition {}", self.buffer.len(), id);
        self.buffer.clear();
        self.flush_count += 1;
        Ok(Some(id))
    }

    /// Flush and release the warehouse
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        Ok(())
    }

    pub fn partition_ids(&self) -> &[PartitionId] {
        self.store.partition_ids()
    }

    pub fn partition_count(&self) -> usize {
        self.store.partition_count()
    }

    pub fn partition_row_count(&self, id: PartitionId) -> Option<usize> {
        self.store.row_count(id)
    }

    pub fn buffered_rows(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_cached(&self, id: PartitionId) -> bool {
        self.store.is_cached(id)
    }

    /// Rows of one partition, read through the cache
    pub fn partition_rows(&mut self, id: PartitionId) -> Result<Vec<Row>> {
        Ok(self.store.read(id)?.as_ref().clone())
    }

    pub fn zone_maps(&self) -> &ZoneMapIndex {
        self.store.zone_maps()
    }

    pub fn stats(&self) -> WarehouseStats {
        WarehouseStats {
            partition_count: self.store.partition_count(),
            partition_rows: self.store.total_rows(),
            buffered_rows: self.buffer.len(),
            zone_map_entries: self.store.zone_maps().entry_count(),
            bytes_written: self.store.bytes_written(),
            cache_stats: self.store.cache_stats(),
            flush_count: self.flush_count,
            partitions_scanned: self.partitions_scanned,
            partitions_pruned: self.partitions_pruned,
        }
    }

    /// Same result as `query_data` but visits every partition, ignoring zone maps
    pub fn query_unpruned(&mut self, key_column: &str, keys: &[Value]) -> Result<Vec<Row>> {
        self.flush()?;
        let ids = self.store.partition_ids().to_vec();
        self.collect_matches(&ids, key_column, keys)
    }

    fn candidates(&mut self, key_column: &str, keys: &[Value]) -> Vec<PartitionId> {
        let candidates = self.store.candidates(key_column, keys);
        self.partitions_pruned += (self.store.partition_count() - candidates.len()) as u64;
        candidates
    }

    fn collect_matches(&mut self, ids: &[PartitionId], key_column: &str, keys: &[Value]) -> Result<Vec<Row>> {
        let wanted: HashSet<String> = keys.iter().map(Value::key_string).collect();
        let mut results = Vec::new();
        for &id in ids {
            let rows = self.store.read(id)?;
            self.partitions_scanned += 1;
            results.extend(
                rows.iter()
                    .filter(|row| key_in(row, key_column, &wanted))
                    .cloned(),
            );
        }
        Ok(results)
    }

    /// First candidate partition holding a row keyed by `key_value`, with its rows
    fn first_matching_partition(
        &mut self,
        key_column: &str,
        key_value: &Value,
    ) -> Result<Option<(PartitionId, Vec<Row>)>> {
        let key = key_value.key_string();
        for id in self.candidates(key_column, slice::from_ref(key_value)) {
            let rows = self.store.read(id)?;
            self.partitions_scanned += 1;
            if rows.iter().any(|row| key_matches(row, key_column, &key)) {
                return Ok(Some((id, rows.as_ref().clone())));
            }
        }
        Ok(None)
    }
}

/// Plain string equality on the key column; a missing column never matches
fn key_matches(row: &Row, key_column: &str, key: &str) -> bool {
    row.get(key_column)
        .is_some_and(|v| v.key_string() == key)
}

fn key_in(row: &Row, key_column: &str, keys: &HashSet<String>) -> bool {
    row.get(key_column)
        .is_some_and(|v| keys.contains(&v.key_string()))
}

impl DataWarehouse for Warehouse {
    fn add_data(&mut self, row: Row) -> Result<()> {
        if row.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "row has no columns".to_string(),
            ));
        }
        if self.buffer.push(row) {
            // A failed auto-flush must leave the buffer as it was before this call
            if let Err(err) = self.flush() {
                self.buffer.pop();
                return Err(err);
            }
        }
        Ok(())
    }

    fn update_data(&mut self, key_column: &str, key_value: &Value, patch: &Row) -> Result<usize> {
        self.flush()?;

        let Some((id, mut rows)) = self.first_matching_partition(key_column, key_value)? else {
            return Ok(0);
        };

        let key = key_value.key_string();
        let mut patched = 0;
        for row in rows.iter_mut().filter(|row| key_matches(row, key_column, &key)) {
            for (column, value) in patch {
                row.insert(column.clone(), value.clone());
            }
            patched += 1;
        }

        self.store.rewrite(id, rows)?;
        debug!("updated {} rows in partition {}", patched, id);
        Ok(patched)
    }

    fn delete_data(&mut self, key_column: &str, key_value: &Value) -> Result<usize> {
        self.flush()?;

        let Some((id, mut rows)) = self.first_matching_partition(key_column, key_value)? else {
            return Ok(0);
        };

        let key = key_value.key_string();
        let before = rows.len();
        rows.retain(|row| !key_matches(row, key_column, &key));
        let removed = before - rows.len();

        self.store.rewrite(id, rows)?;
        debug!("deleted {} rows from partition {}", removed, id);
        Ok(removed)
    }

    fn query_data(&mut self, key_column: &str, keys: &[Value]) -> Result<Vec<Row>> {
        self.flush()?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let candidates = self.candidates(key_column, keys);
        self.collect_matches(&candidates, key_column, keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use crate::row;
    use crate::storage::backend::MemoryBackend;
    use crate::storage::partition::PartitionHandle;

    fn memory_warehouse(partition_size: usize) -> Warehouse {
        Warehouse::with_backend(Config::new(partition_size, "unused"), Box::new(MemoryBackend::new())).unwrap()
    }

    /// Memory backend whose writes can be switched to fail
    struct FailingWrites {
        inner: MemoryBackend,
        fail: Rc<Cell<bool>>,
    }

    impl PartitionBackend for FailingWrites {
        fn write(&mut self, id: PartitionId, rows: &[Row]) -> Result<PartitionHandle> {
            if self.fail.get() {
                return Err(Error::new(ErrorKind::Io, format!("write of {} failed", id)));
            }
            self.inner.write(id, rows)
        }

        fn read(&self, id: PartitionId) -> Result<Vec<Row>> {
            self.inner.read(id)
        }

        fn delete(&mut self, id: PartitionId) -> Result<()> {
            self.inner.delete(id)
        }
    }

    fn failing_warehouse(partition_size: usize) -> (Warehouse, Rc<Cell<bool>>) {
        let fail = Rc::new(Cell::new(false));
        let backend = FailingWrites {
            inner: MemoryBackend::new(),
            fail: fail.clone(),
        };
        let wh = Warehouse::with_backend(Config::new(partition_size, "unused"), Box::new(backend)).unwrap();
        (wh, fail)
    }

    fn ids(rows: &[Row]) -> Vec<String> {
        rows.iter().map(|r| r["id"].key_string()).collect()
    }

    #[test]
    fn zero_partition_size_is_fatal() {
        let err = Warehouse::with_backend(Config::new(0, "unused"), Box::new(MemoryBackend::new()))
            .err()
            .unwrap();
        assert_eq!(err.kind, ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn empty_row_is_rejected() {
        let mut wh = memory_warehouse(2);
        assert_eq!(wh.add_data(Row::new()).unwrap_err().kind, ErrorKind::InvalidInput);
        assert_eq!(wh.buffered_rows(), 0);
    }

    #[test]
    fn buffer_flushes_at_partition_size() {
        let mut wh = memory_warehouse(2);
        wh.add_data(row! { "id" => "1" }).unwrap();
        assert_eq!((wh.partition_count(), wh.buffered_rows()), (0, 1));
        wh.add_data(row! { "id" => "2" }).unwrap();
        assert_eq!((wh.partition_count(), wh.buffered_rows()), (1, 0));
        wh.add_data(row! { "id" => "3" }).unwrap();
        assert_eq!((wh.partition_count(), wh.buffered_rows()), (1, 1));
    }

    #[test]
    fn explicit_flush_of_empty_buffer_is_noop() {
        let mut wh = memory_warehouse(4);
        assert_eq!(wh.flush().unwrap(), None);
        assert_eq!(wh.partition_count(), 0);
    }

    #[test]
    fn numeric_and_text_keys_match_each_other() {
        let mut wh = memory_warehouse(3);
        wh.add_data(row! { "id" => 7, "name" => "seven" }).unwrap();

        let rows = wh.query_data("id", &[Value::from("7")]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(wh.update_data("id", &Value::Float(7.0), &row! { "name" => "SEVEN" }).unwrap(), 1);
        assert_eq!(wh.query_data("id", &[Value::Int(7)]).unwrap()[0]["name"], Value::from("SEVEN"));
    }

    #[test]
    fn update_patches_every_match_in_first_partition_only() {
        let mut wh = memory_warehouse(2);
        // Partition 0: two rows with id 1; partition 1: another id 1
        wh.add_data(row! { "id" => "1", "v" => "a" }).unwrap();
        wh.add_data(row! { "id" => "1", "v" => "b" }).unwrap();
        wh.add_data(row! { "id" => "1", "v" => "c" }).unwrap();
        wh.add_data(row! { "id" => "2", "v" => "d" }).unwrap();

        let patched = wh.update_data("id", &Value::from("1"), &row! { "v" => "X" }).unwrap();
        assert_eq!(patched, 2);

        let values: Vec<String> = wh
            .query_data("id", &[Value::from("1")])
            .unwrap()
            .iter()
            .map(|r| r["v"].key_string())
            .collect();
        assert_eq!(values, vec!["X", "X", "c"]);
    }

    #[test]
    fn update_can_add_new_columns_and_change_the_key() {
        let mut wh = memory_warehouse(2);
        wh.add_data(row! { "id" => "1" }).unwrap();
        wh.add_data(row! { "id" => "2" }).unwrap();

        wh.update_data("id", &Value::from("2"), &row! { "id" => "20", "email" => "e@x" }).unwrap();

        assert!(wh.query_data("id", &[Value::from("2")]).unwrap().is_empty());
        let rows = wh.query_data("id", &[Value::from("20")]).unwrap();
        assert_eq!(rows[0]["email"], Value::from("e@x"));
        // Zone map follows the rewritten contents
        let entry = wh.zone_maps().entry(wh.partition_ids()[0], "id").unwrap().clone();
        assert_eq!(entry.max, format!("{:0>20}", 20));
    }

    #[test]
    fn delete_removes_matches_from_first_partition_only() {
        let mut wh = memory_warehouse(2);
        wh.add_data(row! { "id" => "5" }).unwrap();
        wh.add_data(row! { "id" => "6" }).unwrap();
        wh.add_data(row! { "id" => "5" }).unwrap();

        assert_eq!(wh.delete_data("id", &Value::from("5")).unwrap(), 1);
        assert_eq!(ids(&wh.query_data("id", &[Value::from("5")]).unwrap()), vec!["5"]);
        assert_eq!(wh.delete_data("id", &Value::from("5")).unwrap(), 1);
        assert!(wh.query_data("id", &[Value::from("5")]).unwrap().is_empty());
    }

    #[test]
    fn deleting_last_row_drops_partition() {
        let mut wh = memory_warehouse(1);
        wh.add_data(row! { "id" => "1" }).unwrap();
        wh.add_data(row! { "id" => "2" }).unwrap();
        let first = wh.partition_ids()[0];

        wh.delete_data("id", &Value::from("1")).unwrap();

        assert_eq!(wh.partition_count(), 1);
        assert!(!wh.partition_ids().contains(&first));
        assert!(!wh.is_cached(first));
        assert_eq!(wh.partition_row_count(first), None);
    }

    #[test]
    fn missing_key_column_never_matches() {
        let mut wh = memory_warehouse(2);
        wh.add_data(row! { "id" => "1", "name" => "a" }).unwrap();
        wh.add_data(row! { "sku" => "1" }).unwrap();

        assert_eq!(wh.query_data("name", &[Value::from("1")]).unwrap().len(), 0);
        assert_eq!(wh.query_data("sku", &[Value::from("1")]).unwrap().len(), 1);
        assert_eq!(wh.update_data("nope", &Value::from("1"), &row! { "x" => 1 }).unwrap(), 0);
        assert_eq!(wh.delete_data("nope", &Value::from("1")).unwrap(), 0);
    }

    #[test]
    fn query_returns_partition_then_row_order_with_duplicates() {
        let mut wh = memory_warehouse(2);
        for id in ["3", "1", "2", "3", "1"] {
            wh.add_data(row! { "id" => id }).unwrap();
        }
        let rows = wh.query_data("id", &[Value::from("1"), Value::from("3")]).unwrap();
        assert_eq!(ids(&rows), vec!["3", "1", "3", "1"]);
        assert!(wh.query_data("id", &[]).unwrap().is_empty());
    }

    #[test]
    fn pruning_is_counted() {
        let mut wh = memory_warehouse(2);
        for id in 1..=6 {
            wh.add_data(row! { "id" => id }).unwrap();
        }
        wh.query_data("id", &[Value::from("5")]).unwrap();
        let stats = wh.stats();
        assert_eq!(stats.partitions_pruned, 2);
        assert_eq!(stats.partitions_scanned, 1);
        assert_eq!(stats.flush_count, 3);
        assert_eq!(stats.total_rows(), 6);
    }

    #[test]
    fn failed_auto_flush_rejects_the_row() {
        let (mut wh, fail) = failing_warehouse(2);
        wh.add_data(row! { "id" => "1" }).unwrap();

        fail.set(true);
        assert_eq!(wh.add_data(row! { "id" => "2" }).unwrap_err().kind, ErrorKind::Io);
        assert_eq!(wh.buffered_rows(), 1);
        assert_eq!(wh.partition_count(), 0);

        // Retrying after the backend recovers stores the row exactly once
        fail.set(false);
        wh.add_data(row! { "id" => "2" }).unwrap();
        assert_eq!(wh.buffered_rows(), 0);
        let first = wh.partition_ids()[0];
        assert_eq!(wh.partition_row_count(first), Some(2));
        assert_eq!(wh.query_data("id", &[Value::from("2")]).unwrap().len(), 1);
    }

    #[test]
    fn failed_explicit_flush_keeps_staged_rows() {
        let (mut wh, fail) = failing_warehouse(5);
        wh.add_data(row! { "id" => "1" }).unwrap();
        wh.add_data(row! { "id" => "2" }).unwrap();

        fail.set(true);
        assert_eq!(wh.flush().unwrap_err().kind, ErrorKind::Io);
        assert_eq!(wh.query_data("id", &[Value::from("1")]).unwrap_err().kind, ErrorKind::Io);
        assert_eq!(wh.buffered_rows(), 2);
        assert_eq!(wh.partition_count(), 0);
        assert_eq!(wh.stats().flush_count, 0);

        fail.set(false);
        assert_eq!(ids(&wh.query_data("id", &[Value::from("1"), Value::from("2")]).unwrap()), vec!["1", "2"]);
        assert_eq!(wh.buffered_rows(), 0);
    }

    #[test]
    fn failed_update_rewrite_leaves_partition_unchanged() {
        let (mut wh, fail) = failing_warehouse(2);
        wh.add_data(row! { "id" => "1", "name" => "a" }).unwrap();
        wh.add_data(row! { "id" => "2", "name" => "b" }).unwrap();

        fail.set(true);
        let err = wh.update_data("id", &Value::from("1"), &row! { "name" => "X" }).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
        assert_eq!(wh.delete_data("id", &Value::from("2")).unwrap_err().kind, ErrorKind::Io);

        fail.set(false);
        let rows = wh.query_data("id", &[Value::from("1"), Value::from("2")]).unwrap();
        assert_eq!(rows[0]["name"], Value::from("a"));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn update_and_delete_skip_false_positive_partitions() {
        let mut wh = memory_warehouse(2);
        // Partition 0 spans [1, 3] without holding 2; partition 1 holds 2
        wh.add_data(row! { "id" => "1" }).unwrap();
        wh.add_data(row! { "id" => "3" }).unwrap();
        wh.add_data(row! { "id" => "2", "name" => "two" }).unwrap();

        assert_eq!(wh.update_data("id", &Value::from("2"), &row! { "name" => "TWO" }).unwrap(), 1);
        // Both partitions pass pruning and both are read
        assert_eq!(wh.stats().partitions_scanned, 2);

        let second = wh.partition_ids()[1];
        assert_eq!(wh.partition_rows(second).unwrap()[0]["name"], Value::from("TWO"));

        assert_eq!(wh.delete_data("id", &Value::from("2")).unwrap(), 1);
        assert_eq!(wh.partition_count(), 1);
        assert_eq!(ids(&wh.query_data("id", &[Value::from("1"), Value::from("3")]).unwrap()), vec!["1", "3"]);
    }
}
