use std::path::{Path, PathBuf};

use slabmap::{DEFAULT_INITIAL_SLABS_SIZE, TableConfig};

pub const DEFAULT_ASSET_BUCKETS: u64 = 9997;
pub const DEFAULT_CERT_BUCKETS: u64 = 997;
pub const DEFAULT_HISTORY_BUCKETS: u64 = 97_777;

pub const ASSET_TABLE_FILE: &str = "asset_table";
pub const CERT_TABLE_FILE: &str = "cert_table";
pub const HISTORY_TABLE_FILE: &str = "history_table";

/// Where the chain tables live and how they are shaped.
///
/// Bucket counts are baked into the files on create and must not change
/// between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub directory: PathBuf,
    pub asset_buckets: u64,
    pub cert_buckets: u64,
    pub history_buckets: u64,
    pub initial_slabs_size: u64,
}

impl Settings {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            asset_buckets: DEFAULT_ASSET_BUCKETS,
            cert_buckets: DEFAULT_CERT_BUCKETS,
            history_buckets: DEFAULT_HISTORY_BUCKETS,
            initial_slabs_size: DEFAULT_INITIAL_SLABS_SIZE,
        }
    }

    pub fn asset_path(&self) -> PathBuf {
        self.directory.join(ASSET_TABLE_FILE)
    }

    pub fn cert_path(&self) -> PathBuf {
        self.directory.join(CERT_TABLE_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.directory.join(HISTORY_TABLE_FILE)
    }

    pub fn asset_config(&self) -> TableConfig {
        TableConfig::new(self.asset_buckets).with_initial_slabs_size(self.initial_slabs_size)
    }

    pub fn cert_config(&self) -> TableConfig {
        TableConfig::new(self.cert_buckets).with_initial_slabs_size(self.initial_slabs_size)
    }

    pub fn history_config(&self) -> TableConfig {
        TableConfig::new(self.history_buckets).with_initial_slabs_size(self.initial_slabs_size)
    }
}
