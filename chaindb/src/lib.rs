//! Chain entity databases built on slab hash tables.
//!
//! Each database owns one table file, hashes its natural key to a 32 byte
//! table key and stores entities as self-delimiting records.

pub mod asset;
pub mod cert;
pub mod codec;
pub mod error;
pub mod history;
pub mod key;
pub mod record_table;
pub mod settings;
pub mod store;

pub use asset::{AssetDatabase, AssetDetail, BlockchainAsset};
pub use cert::{AssetCert, CertDatabase};
pub use codec::{Hash, Record};
pub use error::{Error, Result};
pub use history::{HistoryDatabase, HistoryKind, HistoryRow, OutPoint};
pub use key::{address_key, sha256, symbol_key};
pub use record_table::RecordTable;
pub use settings::Settings;
pub use store::ChainStore;
