//! Document storage.
//!
//! Documents are grouped into named collections and stored under a natural
//! string key. The whole database is opened once per process and handed out
//! to request handlers as scoped per-collection connections.

mod sled;

pub use self::sled::{Connection, SledDb as Database};

use crate::Result;

/// Items stored in their own collection.
pub trait Collectable {
    fn get_collection_name() -> &'static str;
}

/// Items identified by a natural key, e.g. an email address.
pub trait Keyed {
    fn get_key(&self) -> &str;
}

pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let t: T = pot::from_slice(bytes)?;
    Ok(t)
}

pub fn encode<T: serde::Serialize>(item: &T) -> Result<Vec<u8>> {
    let bytes = pot::to_vec(item)?;
    Ok(bytes)
}
