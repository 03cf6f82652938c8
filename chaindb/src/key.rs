use sha2::{Digest, Sha256};

use crate::codec::Hash;

pub fn sha256(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Table key of an asset symbol.
pub fn symbol_key(symbol: &str) -> Hash {
    sha256(symbol.as_bytes())
}

/// Table key of a payment address.
pub fn address_key(address: &str) -> Hash {
    sha256(address.as_bytes())
}
