use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Tree;

use crate::{error::ErrorKind, Result};

use super::{decode, encode, Collectable, Keyed};

/// Connection string opening a temporary, self-removing store.
pub const MEMORY: &str = "memory";

/// Process-wide handle to the document store.
///
/// Cheap to clone, all clones share the same underlying database. Requests
/// get their own [`Connection`] through [`SledDb::acquire`].
#[derive(Clone, Debug)]
pub struct SledDb {
    inner: sled::Db,
    name: String,
}

impl SledDb {
    /// Opens the store found at `url`, namespacing all collections with the
    /// database `name`.
    pub fn connect(url: &str, name: &str) -> Result<Self> {
        let url = url.trim();
        let inner = if url == MEMORY {
            sled::Config::new().temporary(true).open()?
        } else {
            let path = url.strip_prefix("sled://").unwrap_or(url);
            if path.is_empty() {
                return Err(ErrorKind::DbError(format!("invalid store url: {url}")).into());
            }
            sled::Config::default().path(path).open()?
        };
        tracing::debug!(name, "opened store");
        Ok(Self {
            inner,
            name: name.trim().to_string(),
        })
    }

    pub fn connect_with(config: &crate::config::Store) -> Result<Self> {
        let (url, name) = config.params()?;
        Self::connect(url, name)
    }

    /// Opens a temporary store, removed once the last handle is dropped.
    pub fn temporary(name: &str) -> Result<Self> {
        Self::connect(MEMORY, name)
    }

    /// Acquires a connection to the collection defined for the item type.
    pub fn acquire<T: Collectable>(&self) -> Result<Connection> {
        self.acquire_at(T::get_collection_name())
    }

    /// Acquires a connection to the collection specified by name. The
    /// connection is released when dropped.
    pub fn acquire_at(&self, collection: &str) -> Result<Connection> {
        let namespace = format!("{}.{}", self.name, collection);
        let tree = self.inner.open_tree(&namespace)?;
        tracing::trace!(collection = %namespace, "acquired store connection");
        Ok(Connection { tree, namespace })
    }

    /// Flushes all pending writes to disk. The handle stays usable, the
    /// database itself is closed once the last clone is dropped.
    pub fn close(&self) -> Result<()> {
        let bytes = self.inner.flush()?;
        tracing::debug!(name = %self.name, bytes, "flushed store");
        Ok(())
    }
}

/// Scoped access to a single collection.
pub struct Connection {
    tree: Tree,
    namespace: String,
}

impl Connection {
    /// Gets the document stored under `key`, if any.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.tree.get(key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Atomically stores the document unless its key is already taken.
    ///
    /// Returns `true` if the document was stored, `false` if another document
    /// was already present under the same key. Existing documents are never
    /// overwritten.
    pub fn insert_new<T: Serialize + Keyed>(&self, value: &T) -> Result<bool> {
        let encoded = encode(value)?;
        let swapped = self
            .tree
            .compare_and_swap(value.get_key(), None as Option<&[u8]>, Some(encoded))?;
        Ok(swapped.is_ok())
    }

    /// Gets all documents of the collection, in key order.
    pub fn collection<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for entry in self.tree.iter() {
            let (_, value_bytes) = entry?;
            out.push(decode(&value_bytes)?);
        }
        Ok(out)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        tracing::trace!(collection = %self.namespace, "released store connection");
    }
}
