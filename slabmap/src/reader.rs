use std::hash::BuildHasher;

use parking_lot::RwLockReadGuard;
use rustc_hash::FxBuildHasher;

use crate::error::{Error, Result};
use crate::offset::{OFFSET_SIZE, Offset};
use crate::table::{TableInner, hash_key};

/// Shared access to a table.
///
/// Holds the table's read lock, so the file cannot grow while a reader is
/// alive. Every `View` borrows the reader and is therefore gone before the
/// lock is released.
pub struct TableReader<'a, const K: usize, S = FxBuildHasher> {
    pub(crate) inner: RwLockReadGuard<'a, TableInner<K>>,
    pub(crate) hasher: &'a S,
}

/// A zero-copy view of one slab.
#[derive(Debug, Clone, Copy)]
pub struct View<'a, const K: usize> {
    offset: Offset,
    key: &'a [u8; K],
    payload: &'a [u8],
}

impl<'a, const K: usize> View<'a, K> {
    /// File offset of the slab, stable for the life of the file.
    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn key(&self) -> &'a [u8; K] {
        self.key
    }

    /// Payload bytes up to the allocation watermark.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }
}

impl<const K: usize> TableInner<K> {
    fn view(&self, offset: Offset) -> Result<(View<'_, K>, Offset)> {
        let record = self.record(offset)?;
        let bytes = self.file.bytes();
        let at = (offset.get() + OFFSET_SIZE) as usize;
        let key: &[u8; K] = bytes[at..at + K]
            .try_into()
            .map_err(|_| Error::corrupt_chain(offset.get()))?;
        let payload = &bytes[record.payload.start as usize..record.payload.end as usize];
        Ok((
            View {
                offset,
                key,
                payload,
            },
            record.next,
        ))
    }
}

/// Walks one bucket chain from newest to oldest slab.
///
/// Stops after the first error, a chain cannot be trusted past a bad link.
pub struct Chain<'a, const K: usize> {
    inner: &'a TableInner<K>,
    next: Offset,
    failed: bool,
}

impl<'a, const K: usize> Iterator for Chain<'a, K> {
    type Item = Result<View<'a, K>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next.is_empty() {
            return None;
        }
        match self.inner.view(self.next) {
            Ok((view, next)) => {
                self.next = next;
                Some(Ok(view))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// The slabs of a chain stored under one key, newest first.
pub struct Matches<'a, const K: usize> {
    chain: Chain<'a, K>,
    key: [u8; K],
}

impl<'a, const K: usize> Iterator for Matches<'a, K> {
    type Item = Result<View<'a, K>>;

    fn next(&mut self) -> Option<Self::Item> {
        for item in self.chain.by_ref() {
            match item {
                Ok(view) if *view.key() != self.key => continue,
                other => return Some(other),
            }
        }
        None
    }
}

impl<const K: usize, S: BuildHasher> TableReader<'_, K, S> {
    pub fn bucket_count(&self) -> u64 {
        self.inner.header.bucket_count()
    }

    /// Walks every slab of bucket `index`, whatever its key.
    ///
    /// Panics if `index` is not below the bucket count.
    pub fn bucket(&self, index: u64) -> Chain<'_, K> {
        let inner = &*self.inner;
        Chain {
            inner,
            next: inner.header.read(&inner.file, index),
            failed: false,
        }
    }

    /// Every slab in the table, bucket by bucket.
    pub fn records(&self) -> impl Iterator<Item = Result<View<'_, K>>> + '_ {
        (0..self.bucket_count()).flat_map(move |index| self.bucket(index))
    }

    /// Every slab stored under `key`, newest first.
    pub fn finds(&self, key: &[u8; K]) -> Matches<'_, K> {
        let index = self.inner.header.bucket_index(hash_key(self.hasher, key));
        Matches {
            chain: self.bucket(index),
            key: *key,
        }
    }

    /// The most recently stored slab under `key`.
    pub fn find(&self, key: &[u8; K]) -> Result<Option<View<'_, K>>> {
        self.finds(key).next().transpose()
    }

    /// The oldest slab still linked under `key`.
    pub fn rfind(&self, key: &[u8; K]) -> Result<Option<View<'_, K>>> {
        let mut last = None;
        for view in self.finds(key) {
            last = Some(view?);
        }
        Ok(last)
    }
}
