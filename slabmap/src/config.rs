use crate::bucket_header::header_size;
use crate::offset::OFFSET_SIZE;

/// Slab space reserved when a table file is created.
pub const DEFAULT_INITIAL_SLABS_SIZE: u64 = 4096;

/// Shape of a table file.
///
/// The bucket count is fixed when the file is created and must be passed
/// unchanged when it is opened again; tables are never rehashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    pub bucket_count: u64,
    pub initial_slabs_size: u64,
}

impl TableConfig {
    pub fn new(bucket_count: u64) -> Self {
        Self {
            bucket_count,
            initial_slabs_size: DEFAULT_INITIAL_SLABS_SIZE,
        }
    }

    pub fn with_initial_slabs_size(mut self, initial_slabs_size: u64) -> Self {
        self.initial_slabs_size = initial_slabs_size;
        self
    }

    /// Header plus watermark, the smallest valid table file.
    pub fn minimum_file_size(&self) -> u64 {
        header_size(self.bucket_count) + OFFSET_SIZE
    }

    /// Size of a freshly created table file.
    pub fn initial_file_size(&self) -> u64 {
        self.minimum_file_size() + self.initial_slabs_size
    }
}
