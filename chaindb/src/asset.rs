use std::io::{self, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use slabmap::TableConfig;

use crate::codec::{
    HASH_SIZE, Hash, Record, read_hash, read_string, read_u8, read_u32, read_u64, string_size,
    write_string,
};
use crate::error::Result;
use crate::key::symbol_key;
use crate::record_table::RecordTable;

/// An issued asset as declared by its issuing transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDetail {
    pub symbol: String,
    pub maximum_supply: u64,
    pub decimal_number: u8,
    pub issuer: String,
    pub address: String,
    pub description: String,
}

impl Record for AssetDetail {
    fn serialized_size(&self) -> usize {
        string_size(&self.symbol)
            + 8
            + 1
            + string_size(&self.issuer)
            + string_size(&self.address)
            + string_size(&self.description)
    }

    fn to_data(&self, mut sink: &mut [u8]) -> io::Result<()> {
        write_string(&mut sink, &self.symbol)?;
        sink.write_u64::<LittleEndian>(self.maximum_supply)?;
        sink.write_u8(self.decimal_number)?;
        write_string(&mut sink, &self.issuer)?;
        write_string(&mut sink, &self.address)?;
        write_string(&mut sink, &self.description)
    }

    fn from_data(source: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            symbol: read_string(source, "asset.symbol")?,
            maximum_supply: read_u64(source, "asset.maximum_supply")?,
            decimal_number: read_u8(source, "asset.decimal_number")?,
            issuer: read_string(source, "asset.issuer")?,
            address: read_string(source, "asset.address")?,
            description: read_string(source, "asset.description")?,
        })
    }
}

/// An asset together with the output that put it on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockchainAsset {
    pub tx_hash: Hash,
    pub index: u32,
    pub height: u64,
    pub asset: AssetDetail,
}

impl Record for BlockchainAsset {
    fn serialized_size(&self) -> usize {
        HASH_SIZE + 4 + 8 + self.asset.serialized_size()
    }

    fn to_data(&self, mut sink: &mut [u8]) -> io::Result<()> {
        sink.write_all(&self.tx_hash)?;
        sink.write_u32::<LittleEndian>(self.index)?;
        sink.write_u64::<LittleEndian>(self.height)?;
        self.asset.to_data(sink)
    }

    fn from_data(source: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            tx_hash: read_hash(source, "blockchain_asset.tx_hash")?,
            index: read_u32(source, "blockchain_asset.index")?,
            height: read_u64(source, "blockchain_asset.height")?,
            asset: AssetDetail::from_data(source)?,
        })
    }
}

/// Issued assets keyed by the hash of their symbol.
///
/// Every issue and secondary issue of a symbol is kept; the oldest record
/// under a symbol is its original registration.
pub struct AssetDatabase {
    table: RecordTable<BlockchainAsset>,
}

impl AssetDatabase {
    pub fn create(path: impl AsRef<Path>, config: TableConfig) -> Result<Self> {
        Ok(Self {
            table: RecordTable::create("asset", path, config)?,
        })
    }

    pub fn open(path: impl AsRef<Path>, config: TableConfig) -> Result<Self> {
        Ok(Self {
            table: RecordTable::open("asset", path, config)?,
        })
    }

    pub fn store(&self, key: &Hash, asset: &BlockchainAsset) -> Result<()> {
        self.table.store(key, asset)?;
        Ok(())
    }

    /// The original registration stored under `key`.
    pub fn get(&self, key: &Hash) -> Result<Option<BlockchainAsset>> {
        self.table.rfind(key)
    }

    /// Unlinks the newest record under `key`.
    pub fn remove(&self, key: &Hash) -> Result<bool> {
        self.table.unlink(key)
    }

    /// Total supply issued under `symbol` across all of its records.
    pub fn get_asset_volume(&self, symbol: &str) -> Result<u64> {
        let history = self.table.finds(&symbol_key(symbol))?;
        Ok(history
            .iter()
            .fold(0u64, |volume, record| volume.saturating_add(record.asset.maximum_supply)))
    }

    /// Every record stored under `symbol`, newest first.
    pub fn get_asset_history(&self, symbol: &str) -> Result<Vec<BlockchainAsset>> {
        self.table.finds(&symbol_key(symbol))
    }

    /// The history of `symbol`, or every asset in the table when no symbol
    /// is given.
    pub fn get_blockchain_assets(&self, symbol: Option<&str>) -> Result<Vec<BlockchainAsset>> {
        match symbol {
            Some(symbol) if !symbol.is_empty() => self.get_asset_history(symbol),
            _ => self.table.scan(),
        }
    }

    pub fn get_register_history(&self, symbol: &str) -> Result<Option<BlockchainAsset>> {
        self.table.rfind(&symbol_key(symbol))
    }

    /// Height at which `symbol` was first registered.
    pub fn get_register_height(&self, symbol: &str) -> Result<Option<u64>> {
        Ok(self.get_register_history(symbol)?.map(|record| record.height))
    }

    pub fn sync(&self) -> Result<()> {
        self.table.sync()
    }

    pub fn stop(&self) -> Result<()> {
        self.table.stop()
    }

    pub fn close(&self) -> Result<()> {
        self.table.close()
    }
}
