use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use memmap2::MmapMut;

use crate::error::{Error, Result};

/// A growable file mapped read-write into memory.
///
/// All positions handed out by the table are file-relative, so the mapping can
/// move on `resize` without invalidating anything that is persisted. Slices
/// obtained from `bytes`/`bytes_mut` borrow the `MappedFile`, and `resize`
/// takes `&mut self`, so no slice can survive a remap.
pub struct MappedFile {
    path: PathBuf,
    file: Option<File>,
    mmap: Option<MmapMut>,
    resizes: u64,
}

impl MappedFile {
    /// Creates a new backing file of `initial_size` bytes and maps it.
    ///
    /// Fails if the file already exists or the space cannot be reserved.
    pub fn create(path: impl AsRef<Path>, initial_size: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;
        file.set_len(initial_size)?;

        Self::map(path, file)
    }

    /// Opens an existing backing file and maps it.
    ///
    /// Fails if the file is missing or shorter than `min_size`.
    pub fn open(path: impl AsRef<Path>, min_size: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let len = file.metadata()?.len();
        if len < min_size {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{} is {len} bytes, expected at least {min_size}",
                    path.display()
                ),
            )));
        }

        Self::map(path, file)
    }

    fn map(path: PathBuf, file: File) -> Result<Self> {
        // SAFETY: the file is owned by this struct and only ever grows while mapped.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self {
            path,
            file: Some(file),
            mmap: Some(mmap),
            resizes: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true until `stop` or `close` is called.
    pub fn is_open(&self) -> bool {
        self.mmap.is_some()
    }

    /// Mapped length in bytes, zero once stopped.
    pub fn len(&self) -> u64 {
        self.mmap.as_ref().map_or(0, |m| m.len() as u64)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of times the mapping was grown since it was opened.
    pub fn resize_count(&self) -> u64 {
        self.resizes
    }

    pub fn bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.mmap.as_deref_mut().unwrap_or(&mut [])
    }

    /// Grows the file to `new_size` bytes and remaps it.
    ///
    /// Shrinking is never performed, a smaller size is a no-op. On failure the
    /// previous mapping stays in place.
    pub fn resize(&mut self, new_size: u64) -> Result<()> {
        if !self.is_open() {
            return Err(Error::Closed);
        }
        let current = self.len();
        if new_size <= current {
            return Ok(());
        }
        let file = self.file.as_ref().ok_or(Error::Closed)?;

        file.set_len(new_size)?;
        // SAFETY: see `map`.
        let mmap = unsafe { MmapMut::map_mut(file)? };

        // Replacing the old map unmaps it
        self.mmap = Some(mmap);
        self.resizes += 1;

        tracing::info!(
            path = %self.path.display(),
            from = current,
            to = new_size,
            "grew mapped file"
        );
        Ok(())
    }

    /// Flushes dirty pages and file metadata to disk.
    pub fn flush(&self) -> Result<()> {
        if let Some(mmap) = &self.mmap {
            mmap.flush()?;
        }
        if let Some(file) = &self.file {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Flushes and unmaps the file. Safe to call more than once.
    pub fn stop(&mut self) -> Result<()> {
        if self.mmap.is_some() {
            self.flush()?;
            self.mmap = None;
        }
        Ok(())
    }

    /// Unmaps and releases the file handle. Safe to call more than once.
    pub fn close(&mut self) -> Result<()> {
        self.stop()?;
        self.file = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.bin");

        {
            let mut file = MappedFile::create(&path, 64).unwrap();
            assert_eq!(file.len(), 64);
            file.bytes_mut()[..5].copy_from_slice(b"hello");
            file.close().unwrap();
        }

        let file = MappedFile::open(&path, 8).unwrap();
        assert_eq!(file.len(), 64);
        assert_eq!(&file.bytes()[..5], b"hello");
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.bin");
        MappedFile::create(&path, 16).unwrap();

        assert!(matches!(MappedFile::create(&path, 16), Err(Error::Io(_))));
    }

    #[test]
    fn test_open_missing_or_short() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.bin");
        assert!(matches!(MappedFile::open(&missing, 8), Err(Error::Io(_))));

        let short = dir.path().join("short.bin");
        MappedFile::create(&short, 4).unwrap();
        match MappedFile::open(&short, 8) {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            other => panic!("expected invalid data, got {:?}", other.map(|f| f.len())),
        }
    }

    #[test]
    fn test_resize_keeps_contents() {
        let dir = tempdir().unwrap();
        let mut file = MappedFile::create(dir.path().join("table.bin"), 32).unwrap();
        file.bytes_mut()[30..32].copy_from_slice(&[7, 9]);

        file.resize(4096).unwrap();
        assert_eq!(file.len(), 4096);
        assert_eq!(&file.bytes()[30..32], &[7, 9]);
        // New space is zeroed by the OS
        assert!(file.bytes()[32..].iter().all(|&b| b == 0));
        assert_eq!(file.resize_count(), 1);

        // Never shrinks
        file.resize(16).unwrap();
        assert_eq!(file.len(), 4096);
        assert_eq!(file.resize_count(), 1);
    }

    #[test]
    fn test_stop_and_close_are_idempotent() {
        let dir = tempdir().unwrap();
        let mut file = MappedFile::create(dir.path().join("table.bin"), 32).unwrap();

        file.stop().unwrap();
        file.stop().unwrap();
        assert!(!file.is_open());
        assert_eq!(file.len(), 0);
        assert!(file.bytes().is_empty());

        file.close().unwrap();
        file.close().unwrap();
        assert!(matches!(file.resize(64), Err(Error::Closed)));
    }
}
