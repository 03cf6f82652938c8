use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

/// Size of a transaction or key hash.
pub const HASH_SIZE: usize = 32;

pub type Hash = [u8; HASH_SIZE];

/// An entity that is stored as the payload of a slab.
///
/// Slab payloads carry no length, so encodings must be self-delimiting:
/// `from_data` consumes exactly the bytes `to_data` produced and leaves
/// whatever follows untouched.
pub trait Record: Sized {
    /// Number of bytes `to_data` writes.
    fn serialized_size(&self) -> usize;

    /// Writes the record into the front of `sink`.
    fn to_data(&self, sink: &mut [u8]) -> io::Result<()>;

    /// Reads a record from the front of `source` and advances it.
    fn from_data(source: &mut &[u8]) -> Result<Self>;
}

/// Decodes a record from a slab payload.
pub fn decode<R: Record>(payload: &[u8]) -> Result<R> {
    let mut source = payload;
    R::from_data(&mut source)
}

/// Encodes a record into a fresh buffer of exactly `serialized_size` bytes.
pub fn encode<R: Record>(record: &R) -> io::Result<Vec<u8>> {
    let mut data = vec![0u8; record.serialized_size()];
    record.to_data(&mut data)?;
    Ok(data)
}

pub fn string_size(value: &str) -> usize {
    4 + value.len()
}

pub fn write_string<W: Write>(sink: &mut W, value: &str) -> io::Result<()> {
    let len = u32::try_from(value.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string longer than u32::MAX"))?;
    sink.write_u32::<LittleEndian>(len)?;
    sink.write_all(value.as_bytes())
}

pub fn read_string(source: &mut &[u8], field: &str) -> Result<String> {
    let len = read_u32(source, field)? as usize;
    if len > source.len() {
        return Err(Error::decode(
            field,
            format!("string of {len} bytes, {} remaining", source.len()),
        ));
    }
    let (bytes, rest) = source.split_at(len);
    *source = rest;
    String::from_utf8(bytes.to_vec()).map_err(|e| Error::decode(field, e))
}

pub fn read_hash(source: &mut &[u8], field: &str) -> Result<Hash> {
    let mut hash = [0u8; HASH_SIZE];
    source
        .read_exact(&mut hash)
        .map_err(|e| Error::decode(field, e))?;
    Ok(hash)
}

pub fn read_u64(source: &mut &[u8], field: &str) -> Result<u64> {
    source
        .read_u64::<LittleEndian>()
        .map_err(|e| Error::decode(field, e))
}

pub fn read_u32(source: &mut &[u8], field: &str) -> Result<u32> {
    source
        .read_u32::<LittleEndian>()
        .map_err(|e| Error::decode(field, e))
}

pub fn read_u8(source: &mut &[u8], field: &str) -> Result<u8> {
    source.read_u8().map_err(|e| Error::decode(field, e))
}
