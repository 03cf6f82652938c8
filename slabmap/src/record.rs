use std::ops::Range;

use crate::error::{Error, Result};
use crate::offset::{OFFSET_SIZE, Offset};

/// Bytes in front of the payload of a slab keyed by `K` bytes.
pub const fn record_header_size(key_size: usize) -> u64 {
    OFFSET_SIZE + key_size as u64
}

/// One slab of a chain, decoded from the mapping on demand.
///
/// Layout:
/// [next][key][payload]
///
/// `next` links to the previously stored slab of the same bucket, so it is
/// always smaller than `offset` (or empty). The payload has no stored length,
/// `payload` runs up to the allocation watermark and the record encoding is
/// expected to be self-delimiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlabRecord<const K: usize> {
    pub offset: Offset,
    pub next: Offset,
    pub key: [u8; K],
    pub payload: Range<u64>,
}

impl<const K: usize> SlabRecord<K> {
    /// Reads the slab at `offset`, which must lie inside `slabs`.
    pub fn read(bytes: &[u8], offset: Offset, slabs: Range<u64>) -> Result<Self> {
        let start = offset.get();
        let limit = slabs.end.min(bytes.len() as u64);
        let payload_start = start
            .checked_add(record_header_size(K))
            .filter(|&end| start >= slabs.start && end <= limit)
            .ok_or_else(|| Error::corrupt_chain(start))?;

        let at = start as usize;
        let mut next = [0u8; 8];
        next.copy_from_slice(&bytes[at..at + OFFSET_SIZE as usize]);
        let next = Offset::from_le_bytes(next);

        // Slabs are prepended, an older slab always sits at a lower offset
        if !next.is_empty() && next >= offset {
            return Err(Error::corrupt_chain(next.get()));
        }

        let mut key = [0u8; K];
        key.copy_from_slice(&bytes[at + OFFSET_SIZE as usize..payload_start as usize]);

        Ok(Self {
            offset,
            next,
            key,
            payload: payload_start..limit,
        })
    }
}
