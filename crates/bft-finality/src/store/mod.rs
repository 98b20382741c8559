//! Typed sub-stores layered over the caller's key-value store.
//!
//! Three independent logical sub-stores live under fixed prefixes:
//!
//! | Sub-store      | Key                     | Value                      |
//! |----------------|-------------------------|----------------------------|
//! | Parameters     | big-endian u32 height   | encoded `BftParameters`    |
//! | Votes          | fixed key (singleton)   | encoded `BftVotes`         |
//! | Generator keys | big-endian u32 height   | encoded `GeneratorKeys`    |
//!
//! Heights are big-endian so lexicographic key order matches numeric order,
//! which is what makes floor lookups a reverse range scan with limit 1.

pub mod cache;
pub mod keys;
pub mod params;
pub mod votes;

use crate::error::{BftError, BftResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub(crate) const PREFIX_PARAMS: &[u8] = b"bft:params:";
pub(crate) const PREFIX_VOTES: &[u8] = b"bft:votes";
pub(crate) const PREFIX_KEYS: &[u8] = b"bft:keys:";

pub(crate) fn height_key(prefix: &[u8], height: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + 4);
    key.extend_from_slice(prefix);
    key.extend_from_slice(&height.to_be_bytes());
    key
}

pub(crate) fn decode_height(prefix: &[u8], key: &[u8]) -> BftResult<u32> {
    key.strip_prefix(prefix)
        .and_then(|suffix| <[u8; 4]>::try_from(suffix).ok())
        .map(u32::from_be_bytes)
        .ok_or_else(|| BftError::Codec {
            reason: format!("malformed height key {key:02x?}"),
        })
}

pub(crate) fn encode<T: Serialize>(value: &T) -> BftResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| BftError::Codec {
        reason: e.to_string(),
    })
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> BftResult<T> {
    bincode::deserialize(bytes).map_err(|e| BftError::Codec {
        reason: e.to_string(),
    })
}
