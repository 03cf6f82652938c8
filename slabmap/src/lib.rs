//! A persistent chained hash table stored in a single memory-mapped file.
//!
//! Records are slabs of `[next][key][payload]` bump-allocated after a fixed
//! bucket header. Every bucket chain is newest first, duplicate keys are kept,
//! and nothing is ever moved, so a slab offset stays valid for the life of the
//! file.

pub mod bucket_header;
pub mod config;
pub mod error;
pub mod mapped_file;
pub mod offset;
mod reader;
pub mod record;
pub mod slab_manager;
mod table;

pub use bucket_header::BucketHeader;
pub use config::{DEFAULT_INITIAL_SLABS_SIZE, TableConfig};
pub use error::{Error, Result};
pub use mapped_file::MappedFile;
pub use offset::Offset;
pub use reader::{Chain, Matches, TableReader, View};
pub use record::SlabRecord;
pub use slab_manager::SlabManager;
pub use table::{SlabHashTable, TableStats};
