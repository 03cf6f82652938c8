use std::fmt;

/// Size in bytes of an on-disk offset.
pub const OFFSET_SIZE: u64 = 8;

/// A file-relative byte offset.
///
/// Offsets stay valid across remaps and restarts, unlike addresses into the
/// mapping. Turning an offset into bytes always goes through a bounds-checked
/// resolve against the current mapping.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Offset(u64);

impl Offset {
    /// Terminates a chain and marks an empty bucket.
    pub const EMPTY: Offset = Offset(u64::MAX);

    pub const fn new(value: u64) -> Self {
        Offset(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Offset(u64::from_le_bytes(bytes))
    }

    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl fmt::Debug for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Offset(EMPTY)")
        } else {
            write!(f, "Offset({})", self.0)
        }
    }
}

impl From<Offset> for u64 {
    fn from(offset: Offset) -> u64 {
        offset.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sentinel_is_all_ones() {
        assert_eq!(Offset::EMPTY.to_le_bytes(), [0xff; 8]);
        assert!(Offset::from_le_bytes([0xff; 8]).is_empty());
        assert!(!Offset::new(0).is_empty());
    }

    #[test]
    fn test_le_bytes() {
        let offset = Offset::new(0x0102_0304_0506_0708);
        assert_eq!(offset.to_le_bytes(), [8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(Offset::from_le_bytes(offset.to_le_bytes()), offset);
    }
}
