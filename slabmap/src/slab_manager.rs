use std::io;

use crate::error::{Error, Result};
use crate::mapped_file::MappedFile;
use crate::offset::{OFFSET_SIZE, Offset};

/// A bump allocator over the region that follows the bucket header.
///
/// Layout:
/// [watermark][slab_0][slab_1]...[slab_n][free_space]
///
/// Slabs are handed out at monotonically increasing file offsets and are never
/// reclaimed. The watermark (next free offset) is written into the mapping on
/// every allocation so that a restarted table never hands out bytes that a
/// linked record still uses; `sync` makes it durable.
#[derive(Debug)]
pub struct SlabManager {
    /// File offset of the persisted watermark field
    position: u64,
    /// Next free file offset
    watermark: u64,
}

impl SlabManager {
    /// Creates a manager whose watermark field lives at `position`.
    pub fn new(position: u64) -> Self {
        Self {
            position,
            watermark: position + OFFSET_SIZE,
        }
    }

    /// File offset of the first slab.
    pub fn slabs_start(&self) -> u64 {
        self.position + OFFSET_SIZE
    }

    /// Next free file offset.
    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    /// Bytes handed out so far.
    pub fn allocated(&self) -> u64 {
        self.watermark - self.slabs_start()
    }

    /// Resets the watermark to the first slab and persists it.
    pub fn create(&mut self, file: &mut MappedFile) -> Result<()> {
        if file.len() < self.slabs_start() {
            return Err(Error::corrupt_header(format!(
                "file holds {} bytes, slab region starts at {}",
                file.len(),
                self.slabs_start()
            )));
        }
        self.watermark = self.slabs_start();
        self.persist(file);
        Ok(())
    }

    /// Loads the persisted watermark.
    pub fn start(&mut self, file: &MappedFile) -> Result<()> {
        if file.len() < self.slabs_start() {
            return Err(Error::corrupt_header(format!(
                "file holds {} bytes, slab region starts at {}",
                file.len(),
                self.slabs_start()
            )));
        }
        let at = self.position as usize;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&file.bytes()[at..at + OFFSET_SIZE as usize]);
        let watermark = u64::from_le_bytes(bytes);

        if watermark < self.slabs_start() || watermark > file.len() {
            return Err(Error::corrupt_header(format!(
                "watermark {watermark} outside slab region {}..{}",
                self.slabs_start(),
                file.len()
            )));
        }
        self.watermark = watermark;
        Ok(())
    }

    /// Reserves `size` bytes and returns the offset of the first one.
    ///
    /// Grows the file when the new watermark would pass the mapped length,
    /// at least doubling it. The watermark only moves once the space exists.
    pub fn allocate(&mut self, file: &mut MappedFile, size: u64) -> Result<Offset> {
        let offset = self.watermark;
        let end = offset.checked_add(size).ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("allocation of {size} bytes overflows the file offset space"),
            ))
        })?;

        let mapped = file.len();
        if end > mapped {
            file.resize(end.max(mapped.saturating_mul(2)))?;
        }

        self.watermark = end;
        self.persist(file);
        Ok(Offset::new(offset))
    }

    /// Flushes the file so the watermark, and every slab below it, survive a
    /// restart. The watermark itself is already written by `allocate`.
    pub fn sync(&self, file: &MappedFile) -> Result<()> {
        file.flush()
    }

    fn persist(&self, file: &mut MappedFile) {
        let at = self.position as usize;
        file.bytes_mut()[at..at + OFFSET_SIZE as usize]
            .copy_from_slice(&self.watermark.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn mapped(len: u64) -> (tempfile::TempDir, MappedFile) {
        let dir = tempdir().unwrap();
        let file = MappedFile::create(dir.path().join("slabs.bin"), len).unwrap();
        (dir, file)
    }

    #[test]
    fn test_create_sets_watermark_after_field() {
        let (_dir, mut file) = mapped(64);
        let mut manager = SlabManager::new(16);
        manager.create(&mut file).unwrap();

        assert_eq!(manager.slabs_start(), 24);
        assert_eq!(manager.watermark(), 24);
        assert_eq!(manager.allocated(), 0);
        assert_eq!(&file.bytes()[16..24], &24u64.to_le_bytes());
    }

    #[test]
    fn test_allocate_is_sequential() {
        let (_dir, mut file) = mapped(128);
        let mut manager = SlabManager::new(0);
        manager.create(&mut file).unwrap();

        let a = manager.allocate(&mut file, 10).unwrap();
        let b = manager.allocate(&mut file, 0).unwrap();
        let c = manager.allocate(&mut file, 5).unwrap();

        assert_eq!(a, Offset::new(8));
        assert_eq!(b, Offset::new(18));
        assert_eq!(c, Offset::new(18));
        assert_eq!(manager.watermark(), 23);
        assert_eq!(file.resize_count(), 0);
    }

    #[test]
    fn test_allocate_grows_file() {
        let (_dir, mut file) = mapped(32);
        let mut manager = SlabManager::new(0);
        manager.create(&mut file).unwrap();

        // Doubles when that is enough
        manager.allocate(&mut file, 30).unwrap();
        assert_eq!(file.len(), 64);

        // Grows to exactly what is needed when doubling is not enough
        let offset = manager.allocate(&mut file, 1000).unwrap();
        assert_eq!(offset, Offset::new(38));
        assert_eq!(file.len(), 1038);
        assert_eq!(file.resize_count(), 2);
    }

    #[test]
    fn test_start_restores_watermark() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("slabs.bin");
        {
            let mut file = MappedFile::create(&path, 64).unwrap();
            let mut manager = SlabManager::new(8);
            manager.create(&mut file).unwrap();
            manager.allocate(&mut file, 20).unwrap();
            manager.sync(&file).unwrap();
            file.close().unwrap();
        }

        let file = MappedFile::open(&path, 16).unwrap();
        let mut manager = SlabManager::new(8);
        manager.start(&file).unwrap();
        assert_eq!(manager.watermark(), 36);
        assert_eq!(manager.allocated(), 20);
    }

    #[test]
    fn test_start_rejects_bad_watermark() {
        let (_dir, mut file) = mapped(64);
        file.bytes_mut()[..8].copy_from_slice(&1000u64.to_le_bytes());
        let mut manager = SlabManager::new(0);
        assert!(matches!(manager.start(&file), Err(Error::CorruptHeader(_))));

        file.bytes_mut()[..8].copy_from_slice(&2u64.to_le_bytes());
        assert!(matches!(manager.start(&file), Err(Error::CorruptHeader(_))));
    }

    #[test]
    fn test_overflowing_allocation_keeps_watermark() {
        let (_dir, mut file) = mapped(64);
        let mut manager = SlabManager::new(0);
        manager.create(&mut file).unwrap();

        assert!(manager.allocate(&mut file, u64::MAX).is_err());
        assert_eq!(manager.watermark(), 8);
    }

    proptest! {
        #[test]
        fn prop_allocations_are_disjoint(sizes in prop::collection::vec(0u64..300, 1..50)) {
            let (_dir, mut file) = mapped(16);
            let mut manager = SlabManager::new(0);
            manager.create(&mut file).unwrap();

            let mut previous_end = manager.slabs_start();
            for size in sizes {
                let offset = manager.allocate(&mut file, size).unwrap().get();
                prop_assert_eq!(offset, previous_end);
                previous_end = offset + size;
                prop_assert!(file.len() >= manager.watermark());
            }
            prop_assert_eq!(manager.watermark(), previous_end);
        }
    }
}
