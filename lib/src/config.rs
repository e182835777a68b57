use std::net::SocketAddr;

use serde::de::DeserializeOwned;

use crate::{ErrorKind, Result};

pub static CONFIG_FILE: &'static str = "unlist.toml";

/// Application configuration.
///
/// # Sensible defaults
///
/// Configuration provided through `Config::default()` serves on
/// `127.0.0.1:8080` with formatted tracing output. The store connection
/// parameters have no defaults and have to be provided either through the
/// config file or the environment (e.g. `STORE__URL` and `STORE__NAME`).
///
/// ```ignore
/// let cfg = Config {
///     store: Store {
///         url: Some("memory".to_string()),
///         name: Some("newsletter".to_string()),
///         ..Default::default()
///     },
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub name: String,
    pub version: String,

    /// Address on which to serve the application. Defaults to
    /// `127.0.0.1:8080`.
    pub address: SocketAddr,

    pub tracing: Tracing,
    pub store: Store,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            tracing: Tracing::default(),
            store: Store::default(),
        }
    }
}

/// Loads application config from toml file at default location.
pub fn load<T: DeserializeOwned>() -> Result<T> {
    load_from(CONFIG_FILE)
}

/// Loads application config from toml file at standard path using provided
/// name.
///
/// For example for `name` == `unlist.toml` we will load both `unlist.toml`
/// and `secret.unlist.toml` from the working directory. Neither file is
/// required, the whole configuration can come from the environment.
pub fn load_from<T: DeserializeOwned>(name: impl AsRef<str>) -> Result<T> {
    let config = config::Config::builder()
        .add_source(config::File::with_name(name.as_ref()).required(false))
        .add_source(config::File::with_name(&format!("secret.{}", name.as_ref())).required(false))
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix_separator("__"),
        )
        .build()?;

    let config: T = config.try_deserialize()?;

    Ok(config)
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Tracing {
    pub enabled: bool,

    pub mode: crate::tracing::Mode,
    pub level: crate::tracing::Level,

    pub loki_address: String,
}

impl Default for Tracing {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: crate::tracing::Mode::default(),
            level: crate::tracing::Level::default(),
            loki_address: "".to_string(),
        }
    }
}

/// Document store connection parameters.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Store {
    /// Connection string. A filesystem path, optionally prefixed with
    /// `sled://`. `memory` opens a temporary store that is removed once the
    /// application exits.
    pub url: Option<String>,
    /// Database name, namespacing the collections within the store.
    pub name: Option<String>,
}

impl Store {
    /// Returns the connection string and database name, failing if either
    /// of them is missing or blank.
    pub fn params(&self) -> Result<(&str, &str)> {
        let url = non_blank(&self.url).ok_or(ErrorKind::StoreNotConfigured("url"))?;
        let name = non_blank(&self.name).ok_or(ErrorKind::StoreNotConfigured("name"))?;
        Ok((url, name))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
