use std::io;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use slabmap::TableConfig;

use crate::codec::{Hash, Record, read_string, read_u32, string_size, write_string};
use crate::error::Result;
use crate::key::sha256;
use crate::record_table::RecordTable;

/// A certificate granting `owner` a right over an asset symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCert {
    pub symbol: String,
    pub owner: String,
    pub address: String,
    pub cert_type: u32,
}

impl AssetCert {
    /// Natural key, one certificate of each type per symbol.
    pub fn natural_key(symbol: &str, cert_type: u32) -> String {
        format!("{symbol}:{cert_type}")
    }

    pub fn key(&self) -> Hash {
        sha256(Self::natural_key(&self.symbol, self.cert_type).as_bytes())
    }
}

impl Record for AssetCert {
    fn serialized_size(&self) -> usize {
        string_size(&self.symbol) + string_size(&self.owner) + string_size(&self.address) + 4
    }

    fn to_data(&self, mut sink: &mut [u8]) -> io::Result<()> {
        write_string(&mut sink, &self.symbol)?;
        write_string(&mut sink, &self.owner)?;
        write_string(&mut sink, &self.address)?;
        sink.write_u32::<LittleEndian>(self.cert_type)
    }

    fn from_data(source: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            symbol: read_string(source, "cert.symbol")?,
            owner: read_string(source, "cert.owner")?,
            address: read_string(source, "cert.address")?,
            cert_type: read_u32(source, "cert.cert_type")?,
        })
    }
}

/// Asset certificates keyed by the hash of `symbol:cert_type`.
///
/// A transfer stores a new record over the old one, so the newest record
/// under a key names the current owner.
pub struct CertDatabase {
    table: RecordTable<AssetCert>,
}

impl CertDatabase {
    pub fn create(path: impl AsRef<Path>, config: TableConfig) -> Result<Self> {
        Ok(Self {
            table: RecordTable::create("cert", path, config)?,
        })
    }

    pub fn open(path: impl AsRef<Path>, config: TableConfig) -> Result<Self> {
        Ok(Self {
            table: RecordTable::open("cert", path, config)?,
        })
    }

    pub fn store(&self, cert: &AssetCert) -> Result<()> {
        self.table.store(&cert.key(), cert)?;
        Ok(())
    }

    pub fn get(&self, key: &Hash) -> Result<Option<AssetCert>> {
        self.table.find(key)
    }

    pub fn get_by_symbol(&self, symbol: &str, cert_type: u32) -> Result<Option<AssetCert>> {
        self.get(&sha256(AssetCert::natural_key(symbol, cert_type).as_bytes()))
    }

    pub fn remove(&self, key: &Hash) -> Result<bool> {
        self.table.unlink(key)
    }

    /// Every certificate record in the table, including superseded ones.
    pub fn get_certs(&self) -> Result<Vec<AssetCert>> {
        self.table.scan()
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
