pub mod layout;
pub mod partition;
pub mod partition_writer;
pub mod partition_reader;
pub mod backend;
pub mod store;
