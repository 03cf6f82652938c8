use std::marker::PhantomData;
use std::path::Path;

use slabmap::{Offset, SlabHashTable, TableConfig, TableReader, TableStats};

use crate::codec::{HASH_SIZE, Hash, Record, decode};
use crate::error::Result;

/// A slab table whose payloads are all records of type `R`, keyed by a
/// 32 byte hash.
pub struct RecordTable<R> {
    name: &'static str,
    table: SlabHashTable<HASH_SIZE>,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Record> RecordTable<R> {
    pub fn create(name: &'static str, path: impl AsRef<Path>, config: TableConfig) -> Result<Self> {
        Ok(Self::new(name, SlabHashTable::create(path, config)?))
    }

    pub fn open(name: &'static str, path: impl AsRef<Path>, config: TableConfig) -> Result<Self> {
        Ok(Self::new(name, SlabHashTable::open(path, config)?))
    }

    fn new(name: &'static str, table: SlabHashTable<HASH_SIZE>) -> Self {
        Self {
            name,
            table,
            _marker: PhantomData,
        }
    }

    /// Serializes `record` straight into a new slab under `key`.
    pub fn store(&self, key: &Hash, record: &R) -> Result<Offset> {
        let size = record.serialized_size();
        let mut written = Ok(());
        let offset = self
            .table
            .store(key, size, |slot| written = record.to_data(slot))?;
        written?;

        tracing::debug!(table = self.name, offset = offset.get(), size, "stored record");
        Ok(offset)
    }

    /// Newest record under `key`.
    pub fn find(&self, key: &Hash) -> Result<Option<R>> {
        self.table.find_map(key, decode::<R>)?.transpose()
    }

    /// Every record under `key`, newest first.
    pub fn finds(&self, key: &Hash) -> Result<Vec<R>> {
        self.table.finds_map(key, decode::<R>)?.into_iter().collect()
    }

    /// Oldest record still linked under `key`.
    pub fn rfind(&self, key: &Hash) -> Result<Option<R>> {
        self.table.rfind_map(key, decode::<R>)?.transpose()
    }

    pub fn unlink(&self, key: &Hash) -> Result<bool> {
        let removed = self.table.unlink(key)?;
        if removed {
            tracing::debug!(table = self.name, "unlinked record");
        }
        Ok(removed)
    }

    /// Every record in the table, bucket by bucket, newest first within a
    /// bucket.
    pub fn scan(&self) -> Result<Vec<R>> {
        let reader = self.table.read()?;
        reader
            .records()
            .map(|view| -> Result<R> { decode(view?.payload()) })
            .collect()
    }

    /// Shared access for walks that stop early.
    pub fn reader(&self) -> Result<TableReader<'_, HASH_SIZE>> {
        Ok(self.table.read()?)
    }

    pub fn stats(&self) -> TableStats {
        self.table.stats()
    }

    pub fn sync(&self) -> Result<()> {
        Ok(self.table.sync()?)
    }

    pub fn stop(&self) -> Result<()> {
        Ok(self.table.stop()?)
    }

    pub fn close(&self) -> Result<()> {
        Ok(self.table.close()?)
    }
}
