use std::hash::BuildHasher;
use std::path::Path;

use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;

use crate::bucket_header::BucketHeader;
use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::mapped_file::MappedFile;
use crate::offset::{OFFSET_SIZE, Offset};
use crate::reader::TableReader;
use crate::record::{SlabRecord, record_header_size};
use crate::slab_manager::SlabManager;

pub(crate) fn hash_key<S: BuildHasher>(hasher: &S, key: &[u8]) -> u64 {
    hasher.hash_one(key)
}

/// Everything behind the table lock.
pub(crate) struct TableInner<const K: usize> {
    pub(crate) file: MappedFile,
    pub(crate) header: BucketHeader,
    pub(crate) manager: SlabManager,
}

impl<const K: usize> TableInner<K> {
    fn ensure_open(&self) -> Result<()> {
        if self.file.is_open() {
            Ok(())
        } else {
            Err(Error::Closed)
        }
    }

    pub(crate) fn record(&self, offset: Offset) -> Result<SlabRecord<K>> {
        SlabRecord::read(
            self.file.bytes(),
            offset,
            self.manager.slabs_start()..self.manager.watermark(),
        )
    }

    fn write_next(&mut self, at: Offset, next: Offset) {
        let at = at.get() as usize;
        self.file.bytes_mut()[at..at + OFFSET_SIZE as usize].copy_from_slice(&next.to_le_bytes());
    }
}

/// Counters describing the state of a table file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    pub bucket_count: u64,
    pub watermark: u64,
    pub mapped_len: u64,
    pub resize_count: u64,
}

/// A persistent chained hash table keyed by `K` byte keys.
///
/// File layout:
/// [bucket_count][head_0]...[head_n-1][watermark][slab][slab]...
///
/// Each bucket holds the offset of the newest slab stored in it and every slab
/// links to the one stored before it. Duplicate keys are allowed and simply
/// chain, newest first. Slabs are never moved or reclaimed, `unlink` only
/// splices them out of their chain.
///
/// Reads take the lock shared, `store` and `unlink` take it exclusively, so
/// the file only ever grows while no reader holds a view into it.
pub struct SlabHashTable<const K: usize, S = FxBuildHasher> {
    inner: RwLock<TableInner<K>>,
    hasher: S,
}

impl<const K: usize, S> SlabHashTable<K, S>
where
    S: BuildHasher + Default,
{
    /// Creates a new table file at `path`.
    pub fn create(path: impl AsRef<Path>, config: TableConfig) -> Result<Self> {
        Self::create_with_hasher(path, config, S::default())
    }

    /// Opens an existing table file created with the same bucket count.
    pub fn open(path: impl AsRef<Path>, config: TableConfig) -> Result<Self> {
        Self::open_with_hasher(path, config, S::default())
    }
}

impl<const K: usize, S: BuildHasher> SlabHashTable<K, S> {
    pub fn create_with_hasher(
        path: impl AsRef<Path>,
        config: TableConfig,
        hasher: S,
    ) -> Result<Self> {
        let header = Self::header_for(&config)?;
        let mut file = MappedFile::create(path, config.initial_file_size())?;
        let mut manager = SlabManager::new(header.size());

        header.create(&mut file)?;
        manager.create(&mut file)?;
        file.flush()?;

        tracing::info!(
            path = %file.path().display(),
            buckets = config.bucket_count,
            size = file.len(),
            "created slab table"
        );

        Ok(Self {
            inner: RwLock::new(TableInner {
                file,
                header,
                manager,
            }),
            hasher,
        })
    }

    /// Opens an existing table file. A short file or a bucket count that
    /// differs from `config` is reported as `CorruptHeader`.
    pub fn open_with_hasher(
        path: impl AsRef<Path>,
        config: TableConfig,
        hasher: S,
    ) -> Result<Self> {
        let header = Self::header_for(&config)?;
        // Header and watermark checks own the size validation
        let file = MappedFile::open(path, 0)?;
        let mut manager = SlabManager::new(header.size());

        header.start(&file)?;
        manager.start(&file)?;

        tracing::info!(
            path = %file.path().display(),
            buckets = config.bucket_count,
            allocated = manager.allocated(),
            "opened slab table"
        );

        Ok(Self {
            inner: RwLock::new(TableInner {
                file,
                header,
                manager,
            }),
            hasher,
        })
    }

    fn header_for(config: &TableConfig) -> Result<BucketHeader> {
        if config.bucket_count == 0 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "bucket count must be greater than zero",
            )));
        }
        Ok(BucketHeader::new(config.bucket_count))
    }

    pub fn bucket_count(&self) -> u64 {
        self.inner.read().header.bucket_count()
    }

    /// Takes the table lock shared for a sequence of reads.
    pub fn read(&self) -> Result<TableReader<'_, K, S>> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        Ok(TableReader {
            inner,
            hasher: &self.hasher,
        })
    }

    /// Stores a new slab of `size` payload bytes under `key`.
    ///
    /// `writer` receives the payload region directly inside the mapping. The
    /// new slab becomes the head of its bucket, any older slabs with the same
    /// key stay reachable behind it. Returns the offset of the slab.
    pub fn store<F>(&self, key: &[u8; K], size: usize, writer: F) -> Result<Offset>
    where
        F: FnOnce(&mut [u8]),
    {
        let hash = hash_key(&self.hasher, key);
        let mut inner = self.inner.write();
        inner.ensure_open()?;

        let TableInner {
            file,
            header,
            manager,
        } = &mut *inner;
        let bucket = header.bucket_index(hash);

        let offset = manager.allocate(file, record_header_size(K) + size as u64)?;
        let next = header.read(file, bucket);

        let start = offset.get() as usize;
        let key_start = start + OFFSET_SIZE as usize;
        let payload_start = key_start + K;
        {
            let bytes = file.bytes_mut();
            bytes[start..key_start].copy_from_slice(&next.to_le_bytes());
            bytes[key_start..payload_start].copy_from_slice(key);
            writer(&mut bytes[payload_start..payload_start + size]);
        }
        header.write(file, bucket, offset);

        tracing::debug!(bucket, offset = offset.get(), size, "stored slab");
        Ok(offset)
    }

    /// Removes the newest slab stored under `key` from its chain.
    ///
    /// The slab bytes are not reclaimed. Returns false if nothing matched.
    pub fn unlink(&self, key: &[u8; K]) -> Result<bool> {
        let hash = hash_key(&self.hasher, key);
        let mut inner = self.inner.write();
        inner.ensure_open()?;

        let bucket = inner.header.bucket_index(hash);
        let mut previous: Option<Offset> = None;
        let mut current = inner.header.read(&inner.file, bucket);

        while !current.is_empty() {
            let record = inner.record(current)?;
            if record.key == *key {
                match previous {
                    None => {
                        let TableInner { file, header, .. } = &mut *inner;
                        header.write(file, bucket, record.next);
                    }
                    Some(previous) => inner.write_next(previous, record.next),
                }
                tracing::debug!(bucket, offset = current.get(), "unlinked slab");
                return Ok(true);
            }
            previous = Some(current);
            current = record.next;
        }
        Ok(false)
    }

    /// Decodes the newest slab stored under `key`.
    pub fn find_map<T>(&self, key: &[u8; K], f: impl FnOnce(&[u8]) -> T) -> Result<Option<T>> {
        let reader = self.read()?;
        Ok(reader.find(key)?.map(|view| f(view.payload())))
    }

    /// Decodes every slab stored under `key`, newest first.
    pub fn finds_map<T>(&self, key: &[u8; K], mut f: impl FnMut(&[u8]) -> T) -> Result<Vec<T>> {
        let reader = self.read()?;
        reader
            .finds(key)
            .map(|view| view.map(|view| f(view.payload())))
            .collect()
    }

    /// Decodes the oldest slab still linked under `key`.
    pub fn rfind_map<T>(&self, key: &[u8; K], f: impl FnOnce(&[u8]) -> T) -> Result<Option<T>> {
        let reader = self.read()?;
        Ok(reader.rfind(key)?.map(|view| f(view.payload())))
    }

    pub fn contains(&self, key: &[u8; K]) -> Result<bool> {
        Ok(self.read()?.find(key)?.is_some())
    }

    /// Flushes the table to disk. Allocation progress since the last sync may
    /// be lost on a crash, linked slabs never are overwritten.
    pub fn sync(&self) -> Result<()> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        inner.manager.sync(&inner.file)
    }

    pub fn stats(&self) -> TableStats {
        let inner = self.inner.read();
        TableStats {
            bucket_count: inner.header.bucket_count(),
            watermark: inner.manager.watermark(),
            mapped_len: inner.file.len(),
            resize_count: inner.file.resize_count(),
        }
    }

    /// Flushes and unmaps the file. Later operations fail with `Closed`.
    pub fn stop(&self) -> Result<()> {
        self.inner.write().file.stop()
    }

    /// Flushes, unmaps and releases the file. Safe to call more than once.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.write();
        let was_open = inner.file.is_open();
        inner.file.close()?;
        if was_open {
            tracing::info!(path = %inner.file.path().display(), "closed slab table");
        }
        Ok(())
    }
}
