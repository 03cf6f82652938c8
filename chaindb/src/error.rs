use std::io;
use thiserror::Error;

/// Errors returned by the entity databases
#[derive(Error, Debug)]
pub enum Error {
    #[error("Slab table error: {0}")]
    Slab(#[from] slabmap::Error),

    /// A stored payload could not be decoded into its entity
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn decode(field: &str, cause: impl std::fmt::Display) -> Self {
        tracing::error!(field, %cause, "failed to decode record");
        Error::Decode(format!("{field}: {cause}"))
    }
}
