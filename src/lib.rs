pub mod core;
pub mod storage;
pub mod index;
pub mod cache;
pub mod writer;
pub mod compression;

pub use crate::core::config::Config;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{Row, Value};
pub use crate::core::warehouse::{DataWarehouse, Warehouse};

/*
┌────────────────────────────────────────────────────────────────────────────────────────────┐
│                            ZONEHOUSE STRUCT ARCHITECTURE                                    │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────────── CORE LAYER ──────────────────────────────────────────┐
│                                                                                              │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                               struct Warehouse                                      │    │
│  │  ┌──────────────────────────────────────────────────────────────────────────────┐ │    │
│  │  │ config: Config                    // Partition size, cache, id columns       │ │    │
│  │  │ store: PartitionStore             // Partitions + zone maps + cache          │ │    │
│  │  │ buffer: InsertBuffer              // Rows not yet in a partition             │ │    │
│  │  │ // Metrics                                                                   │ │    │
│  │  │ flush_count: u64                                                             │ │    │
│  │  │ partitions_scanned: u64                                                      │ │    │
│  │  │ partitions_pruned: u64                                                       │ │    │
│  │  └──────────────────────────────────────────────────────────────────────────────┘ │    │
│  │  impl DataWarehouse: add_data / update_data / delete_data / query_data            │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│                                                                                              │
│  ┌──────────────────┐  ┌──────────────────┐  ┌───────────────────────────────────────┐    │
│  │ struct Config    │  │ type Row =       │  │ struct WarehouseStats                 │    │
│  │ • storage_path   │  │   BTreeMap<      │  │ • partition_count                     │    │
│  │ • partition_size │  │   String, Value> │  │ • partition_rows / buffered_rows      │    │
│  │ • cache_capacity │  │                  │  │ • zone_map_entries                    │    │
│  │ • identifier_*   │  │ enum Value       │  │ • cache_stats: CacheStats             │    │
│  │ • compression    │  │ • Null / Bool    │  │ • partitions_scanned / _pruned        │    │
│  └──────────────────┘  │ • Int / Float    │  └───────────────────────────────────────┘    │
│                        │ • Text(String)   │                                                │
│                        └──────────────────┘                                                │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────────── STORAGE LAYER ───────────────────────────────────────┐
│                                                                                              │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                           struct PartitionStore                                     │    │
│  │ backend: Box<dyn PartitionBackend>   // write / read / delete                      │    │
│  │ zone_maps: ZoneMapIndex              // min/max per (partition, column)            │    │
│  │ cache: PartitionCache                // LRU of materialized partitions             │    │
│  │ partitions: Vec<PartitionId>         // live ids, creation order                   │    │
│  │ next_id: PartitionId                 // strictly increasing                        │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│                                                                                              │
│  ┌────────────────────────┐  ┌─────────────────────────┐  ┌────────────────────────┐      │
│  │ struct FileBackend     │  │ struct StorageLayout    │  │ struct MemoryBackend   │      │
│  │ • layout               │  │ • base_dir (wiped)      │  │ • HashMap<Id, Vec<Row>>│      │
│  │ • compression          │  │ • partitions_dir        │  └────────────────────────┘      │
│  │ • sync                 │  └─────────────────────────┘                                   │
│  └────────────────────────┘                                                                 │
│                                                                                              │
│  Partition file (part_{id:08}.zpt):                                                         │
│  [ PartitionHeader: magic | version | rows | columns | crc32 | payload_size | codec ]       │
│  [ CompressedBlock( bincode(ColumnarPayload { columns, values: Vec<Vec<Option<Value>>> }))] │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────────── SCAN PATH ──────────────────────────────────────────┐
│                                                                                              │
│  add_data ──► InsertBuffer ──(full)──► PartitionStore::create ──► zone map + cache          │
│                                                                                              │
│  update / delete / query                                                                     │
│     │ flush buffer                                                                           │
│     ▼                                                                                        │
│  ZoneMapIndex::candidates(key range)  ──►  PartitionCache / backend  ──►  row-level match   │
│                                                                                              │
│  update / delete stop at the first partition with a match; query visits every candidate.   │
└──────────────────────────────────────────────────────────────────────────────────────────────┘
*/
