//! Mailing list unsubscribe service.
//!
//! Records email addresses that asked to be removed from a mailing list.
//! A single `GET /unsubscribe?email=...` route normalizes the address,
//! stores it once together with the time of the request and answers with
//! a status page.
//!
//! ```ignore
//! let config: unlist::Config = unlist::config::load()?;
//! unlist::axum::start(config).await?;
//! ```

#[macro_use]
extern crate serde_derive;

pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod tracing;
pub mod unsubscribe;

#[cfg(feature = "axum")]
pub mod axum;

pub use crate::config::Config;
pub use crate::db::Database;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::unsubscribe::{Insertion, Registry, Store, Unsubscribed};
