use std::io::{self, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use slabmap::TableConfig;

use crate::codec::{HASH_SIZE, Hash, Record, decode, read_hash, read_u8, read_u32, read_u64};
use crate::error::{Error, Result};
use crate::key::address_key;
use crate::record_table::RecordTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Output,
    Spend,
}

impl HistoryKind {
    fn to_byte(self) -> u8 {
        match self {
            HistoryKind::Output => 0,
            HistoryKind::Spend => 1,
        }
    }

    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(HistoryKind::Output),
            1 => Ok(HistoryKind::Spend),
            other => Err(Error::decode("history.kind", format!("unknown kind {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

/// One output received by, or one spend from, an address.
///
/// For an output `point` is the output itself and `value` its amount. For a
/// spend `point` is the spending input and `value` the checksum of the
/// output it spends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRow {
    pub kind: HistoryKind,
    pub point: OutPoint,
    pub height: u64,
    pub value: u64,
}

const ROW_SIZE: usize = 1 + HASH_SIZE + 4 + 8 + 8;

impl Record for HistoryRow {
    fn serialized_size(&self) -> usize {
        ROW_SIZE
    }

    fn to_data(&self, mut sink: &mut [u8]) -> io::Result<()> {
        sink.write_u8(self.kind.to_byte())?;
        sink.write_all(&self.point.hash)?;
        sink.write_u32::<LittleEndian>(self.point.index)?;
        sink.write_u64::<LittleEndian>(self.height)?;
        sink.write_u64::<LittleEndian>(self.value)
    }

    fn from_data(source: &mut &[u8]) -> Result<Self> {
        let kind = HistoryKind::from_byte(read_u8(source, "history.kind")?)?;
        Ok(Self {
            kind,
            point: OutPoint {
                hash: read_hash(source, "history.point.hash")?,
                index: read_u32(source, "history.point.index")?,
            },
            height: read_u64(source, "history.height")?,
            value: read_u64(source, "history.value")?,
        })
    }
}

/// Per address payment history keyed by the hash of the address.
pub struct HistoryDatabase {
    table: RecordTable<HistoryRow>,
}

impl HistoryDatabase {
    pub fn create(path: impl AsRef<Path>, config: TableConfig) -> Result<Self> {
        Ok(Self {
            table: RecordTable::create("history", path, config)?,
        })
    }

    pub fn open(path: impl AsRef<Path>, config: TableConfig) -> Result<Self> {
        Ok(Self {
            table: RecordTable::open("history", path, config)?,
        })
    }

    pub fn add_output(
        &self,
        address: &str,
        outpoint: OutPoint,
        height: u64,
        value: u64,
    ) -> Result<()> {
        self.add(address, HistoryKind::Output, outpoint, height, value)
    }

    pub fn add_spend(
        &self,
        address: &str,
        inpoint: OutPoint,
        height: u64,
        checksum: u64,
    ) -> Result<()> {
        self.add(address, HistoryKind::Spend, inpoint, height, checksum)
    }

    fn add(
        &self,
        address: &str,
        kind: HistoryKind,
        point: OutPoint,
        height: u64,
        value: u64,
    ) -> Result<()> {
        let row = HistoryRow {
            kind,
            point,
            height,
            value,
        };
        self.table.store(&address_key(address), &row)?;
        Ok(())
    }

    /// Rows of `address`, newest first.
    ///
    /// Rows below `from_height` are skipped. A `limit` of zero returns every
    /// remaining row.
    pub fn get(&self, address: &str, limit: usize, from_height: u64) -> Result<Vec<HistoryRow>> {
        let reader = self.table.reader()?;
        let mut rows = Vec::new();
        for view in reader.finds(&address_key(address)) {
            let row: HistoryRow = decode(view?.payload())?;
            if row.height < from_height {
                continue;
            }
            rows.push(row);
            if limit != 0 && rows.len() == limit {
                break;
            }
        }
        Ok(rows)
    }

    /// Drops the newest row of `address`, used when a block is popped.
    pub fn delete_last_row(&self, address: &str) -> Result<bool> {
        self.table.unlink(&address_key(address))
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
