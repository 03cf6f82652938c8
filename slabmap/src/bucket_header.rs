use crate::error::{Error, Result};
use crate::mapped_file::MappedFile;
use crate::offset::{OFFSET_SIZE, Offset};

/// The fixed array of chain heads at the front of the table file.
///
/// Layout:
/// [bucket_count][head_0][head_1]...[head_n-1]
///
/// Every field is an 8 byte little endian integer. The bucket count is
/// written once by `create` and never changes afterwards.
#[derive(Debug, Clone, Copy)]
pub struct BucketHeader {
    bucket_count: u64,
}

/// Size in bytes of a header holding `bucket_count` buckets.
pub const fn header_size(bucket_count: u64) -> u64 {
    OFFSET_SIZE + bucket_count * OFFSET_SIZE
}

impl BucketHeader {
    pub fn new(bucket_count: u64) -> Self {
        assert!(bucket_count > 0, "a table needs at least one bucket");
        Self { bucket_count }
    }

    pub fn bucket_count(&self) -> u64 {
        self.bucket_count
    }

    /// Number of bytes the header occupies at the front of the file.
    pub fn size(&self) -> u64 {
        header_size(self.bucket_count)
    }

    fn check_len(&self, file: &MappedFile) -> Result<()> {
        if file.len() < self.size() {
            return Err(Error::corrupt_header(format!(
                "file holds {} bytes, header for {} buckets needs {}",
                file.len(),
                self.bucket_count,
                self.size()
            )));
        }
        Ok(())
    }

    /// Writes the bucket count and marks every bucket empty.
    pub fn create(&self, file: &mut MappedFile) -> Result<()> {
        self.check_len(file)?;

        let size = self.size() as usize;
        let bytes = &mut file.bytes_mut()[..size];
        bytes[..OFFSET_SIZE as usize].copy_from_slice(&self.bucket_count.to_le_bytes());

        let slots: &mut [[u8; 8]] = bytemuck::cast_slice_mut(&mut bytes[OFFSET_SIZE as usize..]);
        slots.fill(Offset::EMPTY.to_le_bytes());
        Ok(())
    }

    /// Validates the stored bucket count against the expected one.
    pub fn start(&self, file: &MappedFile) -> Result<()> {
        if file.len() < OFFSET_SIZE {
            return Err(Error::corrupt_header("file too short for a bucket count"));
        }
        let mut count = [0u8; 8];
        count.copy_from_slice(&file.bytes()[..OFFSET_SIZE as usize]);
        let stored = u64::from_le_bytes(count);

        if stored != self.bucket_count {
            return Err(Error::corrupt_header(format!(
                "stored bucket count {stored} does not match expected {}",
                self.bucket_count
            )));
        }
        self.check_len(file)
    }

    /// Maps a key hash to its bucket.
    pub fn bucket_index(&self, key_hash: u64) -> u64 {
        key_hash % self.bucket_count
    }

    fn slot_range(&self, index: u64) -> std::ops::Range<usize> {
        assert!(
            index < self.bucket_count,
            "bucket {index} out of range for {} buckets",
            self.bucket_count
        );
        let start = (OFFSET_SIZE + index * OFFSET_SIZE) as usize;
        start..start + OFFSET_SIZE as usize
    }

    /// Head of the chain in bucket `index`.
    pub fn read(&self, file: &MappedFile, index: u64) -> Offset {
        let slot: &[u8; 8] = bytemuck::from_bytes(&file.bytes()[self.slot_range(index)]);
        Offset::from_le_bytes(*slot)
    }

    /// Replaces the head of the chain in bucket `index`.
    pub fn write(&self, file: &mut MappedFile, index: u64, offset: Offset) {
        let range = self.slot_range(index);
        let slot: &mut [u8; 8] = bytemuck::from_bytes_mut(&mut file.bytes_mut()[range]);
        *slot = offset.to_le_bytes();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn mapped(len: u64) -> (tempfile::TempDir, MappedFile) {
        let dir = tempdir().unwrap();
        let file = MappedFile::create(dir.path().join("header.bin"), len).unwrap();
        (dir, file)
    }

    #[test]
    fn test_create_marks_buckets_empty() {
        let header = BucketHeader::new(7);
        let (_dir, mut file) = mapped(header.size());

        header.create(&mut file).unwrap();
        header.start(&file).unwrap();

        assert_eq!(&file.bytes()[..8], &7u64.to_le_bytes());
        for i in 0..7 {
            assert!(header.read(&file, i).is_empty());
        }
    }

    #[test]
    fn test_read_write() {
        let header = BucketHeader::new(3);
        let (_dir, mut file) = mapped(header.size());
        header.create(&mut file).unwrap();

        header.write(&mut file, 1, Offset::new(1234));
        assert_eq!(header.read(&file, 1), Offset::new(1234));
        assert!(header.read(&file, 0).is_empty());
        assert!(header.read(&file, 2).is_empty());

        // Slot 1 lives right after the count and slot 0
        assert_eq!(&file.bytes()[16..24], &1234u64.to_le_bytes());
    }

    #[test]
    fn test_start_rejects_mismatch() {
        let header = BucketHeader::new(5);
        let (_dir, mut file) = mapped(header.size());
        header.create(&mut file).unwrap();

        let other = BucketHeader::new(6);
        assert!(matches!(other.start(&file), Err(Error::CorruptHeader(_))));
    }

    #[test]
    fn test_start_rejects_truncated() {
        let header = BucketHeader::new(5);
        let (_dir, mut file) = mapped(header.size());
        file.bytes_mut()[..8].copy_from_slice(&100u64.to_le_bytes());

        let big = BucketHeader::new(100);
        assert!(matches!(big.start(&file), Err(Error::CorruptHeader(_))));
        assert!(matches!(big.create(&mut file), Err(Error::CorruptHeader(_))));
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_bucket_panics() {
        let header = BucketHeader::new(2);
        let (_dir, file) = mapped(header.size());
        header.read(&file, 2);
    }

    proptest! {
        #[test]
        fn prop_bucket_index_in_range(count in 1u64..100_000, hash in any::<u64>()) {
            let header = BucketHeader::new(count);
            let index = header.bucket_index(hash);
            prop_assert!(index < count);
            prop_assert_eq!(index, hash % count);
        }
    }
}
