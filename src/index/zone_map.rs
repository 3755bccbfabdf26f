use std::collections::{HashMap, HashSet};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use crate::core::types::{Row, Value};
use crate::storage::partition::PartitionId;

/// How a column's values are turned into sortable keys for pruning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonKey {
    /// The value's string form
    Plain,
    /// String form left-padded with zeros to the given width, so "9" < "10"
    ZeroPadded(usize),
}

impl ComparisonKey {
    pub fn apply(&self, value: &Value) -> String {
        let s = value.key_string();
        match *self {
            ComparisonKey::Plain => s,
            ComparisonKey::ZeroPadded(width) => {
                // Negative numbers and over-long values are left as-is
                if s.starts_with('-') || s.len() >= width {
                    s
                } else {
                    format!("{:0>width$}", s, width = width)
                }
            }
        }
    }
}

/// Min/max summary of one column within one partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneMapEntry {
    pub min: String,
    pub max: String,
    pub row_count: usize,   // Rows carrying this column
}

impl ZoneMapEntry {
    /// Range-overlap test against `[key_min, key_max]`
    pub fn overlaps(&self, key_min: &str, key_max: &str) -> bool {
        !(key_max < self.min.as_str() || key_min > self.max.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PartitionZoneMap {
    pub row_count: usize,
    pub columns: HashMap<String, ZoneMapEntry>,
}

/// Per-partition, per-column zone maps
pub struct ZoneMapIndex {
    maps: HashMap<PartitionId, PartitionZoneMap>,
    identifier_columns: HashSet<String>,
    pad_width: usize,
}

impl ZoneMapIndex {
    pub fn new<I, S>(identifier_columns: I, pad_width: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ZoneMapIndex {
            maps: HashMap::new(),
            identifier_columns: identifier_columns.into_iter().map(Into::into).collect(),
            pad_width,
        }
    }

    pub fn comparison_key(&self, column: &str) -> ComparisonKey {
        if self.identifier_columns.contains(column) {
            ComparisonKey::ZeroPadded(self.pad_width)
        } else {
            ComparisonKey::Plain
        }
    }

    pub fn key_for(&self, column: &str, value: &Value) -> String {
        self.comparison_key(column).apply(value)
    }

    /// Summarize `rows` for partition `id`, replacing any previous zone map
    pub fn build(&mut self, id: PartitionId, rows: &[Row]) {
        let mut columns: HashMap<String, ZoneMapEntry> = HashMap::new();

        for row in rows {
            for (column, value) in row {
                let key = self.key_for(column, value);
                match columns.get_mut(column) {
                    Some(entry) => {
                        if key < entry.min {
                            entry.min = key.clone();
                        }
                        if key > entry.max {
                            entry.max = key;
                        }
                        entry.row_count += 1;
                    }
                    None => {
                        columns.insert(column.clone(), ZoneMapEntry {
                            min: key.clone(),
                            max: key,
                            row_count: 1,
                        });
                    }
                }
            }
        }

        self.maps.insert(id, PartitionZoneMap {
            row_count: rows.len(),
            columns,
        });
    }

    pub fn remove(&mut self, id: PartitionId) -> Option<PartitionZoneMap> {
        self.maps.remove(&id)
    }

    pub fn get(&self, id: PartitionId) -> Option<&PartitionZoneMap> {
        self.maps.get(&id)
    }

    pub fn entry(&self, id: PartitionId, column: &str) -> Option<&ZoneMapEntry> {
        self.maps.get(&id).and_then(|m| m.columns.get(column))
    }

    pub fn row_count(&self, id: PartitionId) -> Option<usize> {
        self.maps.get(&id).map(|m| m.row_count)
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Number of (partition, column) entries
    pub fn entry_count(&self) -> usize {
        self.maps.values().map(|m| m.columns.len()).sum()
    }

    /// Lowest and highest comparison key over the whole requested key set
    pub fn key_range(&self, key_column: &str, keys: &[Value]) -> Option<(String, String)> {
        let cmp = self.comparison_key(key_column);
        let mut iter = keys.iter().map(|k| cmp.apply(k));
        let first = iter.next()?;
        let (mut lo, mut hi) = (first.clone(), first);
        for key in iter {
            if key < lo {
                lo = key;
            } else if key > hi {
                hi = key;
            }
        }
        Some((lo, hi))
    }

    /// Partitions (in the given order) that may hold a row whose `key_column`
    /// matches one of `keys`.
    ///
    /// Never drops a partition that could match: without a zone map entry for
    /// the column the partition is kept. False positives are expected and get
    /// filtered by the row-level match.
    pub fn candidates(&self, partitions: &[PartitionId], key_column: &str, keys: &[Value]) -> Vec<PartitionId> {
        let Some((key_min, key_max)) = self.key_range(key_column, keys) else {
            return Vec::new();
        };

        let selected: Vec<PartitionId> = partitions
            .iter()
            .copied()
            .filter(|&id| match self.maps.get(&id) {
                Some(map) => match map.columns.get(key_column) {
                    Some(entry) => entry.overlaps(&key_min, &key_max),
                    None => true,
                },
                None => {
                    warn!("partition {} has no zone map, scanning it", id);
                    true
                }
            })
            .collect();

        debug!(
            "pruned {} of {} partitions for {} in [{}, {}]",
            partitions.len() - selected.len(),
            partitions.len(),
            key_column,
            key_min,
            key_max
        );
        selected
    }
}
