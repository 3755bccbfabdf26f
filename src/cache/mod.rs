pub mod partition_cache;
