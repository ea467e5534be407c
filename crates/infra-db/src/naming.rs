//! In-process naming service.
//!
//! A [`NamingDirectory`] knows a set of context factory names and a set of
//! data-source bindings keyed by `(provider_url, name)`. Lookups through an
//! unregistered factory fail, as do lookups of names nothing is bound to.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::backend::{ConnectOptions, Connection, DataSource, Driver, NamingService};
use crate::error::{ConnectionError, ConnectionInitError};

#[derive(Debug, Default)]
struct Directory {
    factories: HashSet<String>,
    bindings: HashMap<(String, String), Arc<dyn DataSource>>,
}

#[derive(Debug, Default)]
pub struct NamingDirectory {
    inner: RwLock<Directory>,
}

impl NamingDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    // Every update is a single insert or remove, so a poisoned lock still
    // guards a consistent directory.
    fn read(&self) -> RwLockReadGuard<'_, Directory> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Directory> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register_context_factory(&self, factory: impl Into<String>) {
        let factory = factory.into();
        debug!(%factory, "context factory registered");
        self.write().factories.insert(factory);
    }

    /// Bind `source` under `name` at `provider_url`, replacing any earlier
    /// binding.
    pub fn bind(&self, provider_url: impl Into<String>, name: impl Into<String>, source: Arc<dyn DataSource>) {
        let key = (provider_url.into(), name.into());
        debug!(provider_url = %key.0, name = %key.1, "data source bound");
        self.write().bindings.insert(key, source);
    }

    pub fn unbind(&self, provider_url: &str, name: &str) -> bool {
        self.write()
            .bindings
            .remove(&(provider_url.to_string(), name.to_string()))
            .is_some()
    }
}

impl NamingService for NamingDirectory {
    fn lookup(
        &self,
        context_factory: &str,
        provider_url: &str,
        name: &str,
    ) -> Result<Arc<dyn DataSource>, ConnectionInitError> {
        let dir = self.read();

        if !dir.factories.contains(context_factory) {
            return Err(ConnectionInitError::UnknownContextFactory(context_factory.to_string()));
        }
        dir.bindings
            .get(&(provider_url.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ConnectionInitError::NameNotBound {
                name: name.to_string(),
                provider_url: provider_url.to_string(),
            })
    }
}

/// Unpooled [`DataSource`] that opens a fresh driver connection with fixed
/// credentials on every request.
pub struct DriverDataSource {
    name: String,
    driver: Arc<dyn Driver>,
    url: String,
    options: ConnectOptions,
}

impl DriverDataSource {
    pub fn new(name: impl Into<String>, driver: Arc<dyn Driver>, url: impl Into<String>, options: ConnectOptions) -> Self {
        Self {
            name: name.into(),
            driver,
            url: url.into(),
            options,
        }
    }
}

impl fmt::Debug for DriverDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverDataSource")
            .field("name", &self.name)
            .field("driver", &self.driver.name())
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl DataSource for DriverDataSource {
    fn connection(&self) -> Result<Box<dyn Connection>, ConnectionError> {
        self.driver
            .connect(&self.url, &self.options)
            .map_err(|e| ConnectionError::DataSource {
                name: self.name.clone(),
                reason: e.to_string(),
            })
    }
}
