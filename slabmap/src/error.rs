use std::io;
use thiserror::Error;

/// Errors that can occur when working with a slab hash table
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors when creating, growing or mapping the backing file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The header does not match what the caller expects, or the file is
    /// too short to hold it
    #[error("Corrupt header: {0}")]
    CorruptHeader(String),

    /// A chain link or record region points outside the slab region
    #[error("Corrupt chain at offset {offset}")]
    CorruptChain { offset: u64 },

    /// The table was stopped or closed
    #[error("Table is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn corrupt_header(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!(reason = %msg, "corrupt slab table header");
        Error::CorruptHeader(msg)
    }

    pub(crate) fn corrupt_chain(offset: u64) -> Self {
        tracing::error!(offset, "corrupt slab chain");
        Error::CorruptChain { offset }
    }
}
