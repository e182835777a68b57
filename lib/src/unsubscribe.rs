//! Unsubscribed addresses.
//!
//! Presence of an address in the collection is what marks it as opted out.
//! Records are only ever inserted, never updated or removed.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::db::{Collectable, Database, Keyed};
use crate::{ErrorKind, Result};

/// A single address that asked to be removed from the mailing list.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Unsubscribed {
    /// Normalized address, see [`crate::email::normalize`].
    pub email: String,
    pub unsubscribed_at: DateTime<Utc>,
}

impl Unsubscribed {
    /// Creates a record for an already normalized address, timestamped now.
    pub fn new(email: String) -> Self {
        Self {
            email,
            unsubscribed_at: Utc::now(),
        }
    }
}

impl Collectable for Unsubscribed {
    fn get_collection_name() -> &'static str {
        "unsubscribed_emails"
    }
}

impl Keyed for Unsubscribed {
    fn get_key(&self) -> &str {
        &self.email
    }
}

/// Result of recording an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insertion {
    Created,
    AlreadyPresent,
}

/// Persistent storage of unsubscribed addresses.
pub trait Store: Send + Sync {
    /// Records the address unless it's already recorded. Must be atomic with
    /// respect to concurrent calls for the same address.
    fn insert(&self, record: &Unsubscribed) -> Result<Insertion>;

    /// Looks up a normalized address.
    fn find(&self, email: &str) -> Result<Option<Unsubscribed>>;

    /// All recorded addresses.
    fn list(&self) -> Result<Vec<Unsubscribed>>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn insert(&self, record: &Unsubscribed) -> Result<Insertion> {
        (**self).insert(record)
    }

    fn find(&self, email: &str) -> Result<Option<Unsubscribed>> {
        (**self).find(email)
    }

    fn list(&self) -> Result<Vec<Unsubscribed>> {
        (**self).list()
    }
}

impl Store for Database {
    fn insert(&self, record: &Unsubscribed) -> Result<Insertion> {
        let conn = self.acquire::<Unsubscribed>()?;
        if conn.insert_new(record)? {
            Ok(Insertion::Created)
        } else {
            Ok(Insertion::AlreadyPresent)
        }
    }

    fn find(&self, email: &str) -> Result<Option<Unsubscribed>> {
        self.acquire::<Unsubscribed>()?.get(email)
    }

    fn list(&self) -> Result<Vec<Unsubscribed>> {
        self.acquire::<Unsubscribed>()?.collection()
    }
}

/// Shared handle to the store, held by the router for the lifetime of the
/// application.
///
/// A registry without a store is the result of missing connection
/// parameters. It is still usable, but every operation fails without
/// touching any store.
#[derive(Clone, Default)]
pub struct Registry {
    store: Option<Arc<dyn Store>>,
    db: Option<Database>,
    /// Connection parameter found missing, if any.
    missing: Option<&'static str>,
}

impl Registry {
    pub fn new(store: impl Store + 'static) -> Self {
        Self {
            store: Some(Arc::new(store)),
            db: None,
            missing: None,
        }
    }

    /// Opens the database described by the store config. Missing connection
    /// parameters result in an unconfigured registry rather than an error,
    /// failing to open a configured database does not.
    pub fn connect(config: &crate::config::Store) -> Result<Self> {
        let (url, name) = match config.params() {
            Ok(params) => params,
            Err(e) => {
                tracing::warn!("{e}");
                let missing = match e.kind {
                    ErrorKind::StoreNotConfigured(field) => Some(field),
                    _ => None,
                };
                return Ok(Self {
                    missing,
                    ..Self::unconfigured()
                });
            }
        };
        let db = Database::connect(url, name)?;
        Ok(Self {
            store: Some(Arc::new(db.clone())),
            db: Some(db),
            missing: None,
        })
    }

    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    /// Returns the store, or a configuration error if there is none.
    pub fn store(&self) -> Result<&dyn Store> {
        self.store
            .as_deref()
            .ok_or_else(|| ErrorKind::StoreNotConfigured(self.missing.unwrap_or("url")).into())
    }

    /// Flushes the database opened by [`Registry::connect`], if any.
    pub fn close(&self) -> Result<()> {
        match &self.db {
            Some(db) => db.close(),
            None => Ok(()),
        }
    }
}
