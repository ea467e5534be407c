//! Backend seams: connections, statements, cursors, drivers, data sources
//! and naming services.
//!
//! Everything the [`crate::ConnectionManager`] talks to sits behind one of
//! these traits, so tests and embedders can inject their own
//! implementations. The built-in [`crate::RedbDriver`] and
//! [`crate::NamingDirectory`] cover the in-process case.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::{ConnectionError, ConnectionInitError, DbResult};
use crate::naming::NamingDirectory;
use crate::redb_driver::RedbDriver;
use crate::statement::{Row, Statement};

/// An open database connection. The caller owns it and releases it with
/// [`Connection::close`] (or [`crate::ConnectionManager::close_resources`]).
pub trait Connection: Send + fmt::Debug {
    /// Prepare a statement for execution on this connection.
    fn prepare(&mut self, statement: Statement) -> DbResult<Box<dyn PreparedStatement>>;
    fn close(&mut self) -> DbResult<()>;
    fn is_closed(&self) -> bool;
}

/// A statement ready to run.
pub trait PreparedStatement: Send + fmt::Debug {
    /// Run a row-producing statement.
    fn execute_query(&mut self) -> DbResult<Box<dyn RowCursor>>;
    /// Run a modifying statement and return the number of affected rows.
    fn execute_update(&mut self) -> DbResult<u64>;
    fn close(&mut self) -> DbResult<()>;
}

/// Forward-only cursor over query results.
pub trait RowCursor: Send + fmt::Debug {
    fn next_row(&mut self) -> DbResult<Option<Row>>;
    fn close(&mut self) -> DbResult<()>;
}

/// Options handed to a [`Driver`] on every connect.
#[derive(Clone, Default)]
pub struct ConnectOptions {
    pub user: Option<String>,
    pub password: Option<String>,
    /// Upper bound on establishing the connection. `None` leaves it to the
    /// driver.
    pub connect_timeout: Option<Duration>,
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Opens connections for URLs it understands.
pub trait Driver: Send + Sync + fmt::Debug {
    /// Name the driver is registered under.
    fn name(&self) -> &str;
    /// Whether this driver can connect to `url` at all (syntax check only).
    fn accepts_url(&self, url: &str) -> bool;
    fn connect(&self, url: &str, options: &ConnectOptions) -> Result<Box<dyn Connection>, ConnectionError>;
}

/// A named source of connections, usually pooled.
pub trait DataSource: Send + Sync + fmt::Debug {
    fn connection(&self) -> Result<Box<dyn Connection>, ConnectionError>;
}

/// Resolves data-source names, given a context factory and provider URL.
pub trait NamingService: Send + Sync + fmt::Debug {
    fn lookup(
        &self,
        context_factory: &str,
        provider_url: &str,
        name: &str,
    ) -> Result<Arc<dyn DataSource>, ConnectionInitError>;
}

/// Cursor over rows that are already in memory.
#[derive(Debug, Default)]
pub struct RowsCursor {
    rows: std::vec::IntoIter<Row>,
    closed: bool,
}

impl RowsCursor {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter(),
            closed: false,
        }
    }
}

impl RowCursor for RowsCursor {
    fn next_row(&mut self) -> DbResult<Option<Row>> {
        if self.closed {
            return Err(crate::DbError::Closed("cursor"));
        }
        Ok(self.rows.next())
    }

    fn close(&mut self) -> DbResult<()> {
        self.closed = true;
        Ok(())
    }
}

/// Drivers by name.
#[derive(Debug, Default, Clone)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn Driver>>,
}

impl DriverRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in drivers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RedbDriver::new()));
        registry
    }

    /// Register `driver` under its own name, replacing any previous one.
    pub fn register(&mut self, driver: Arc<dyn Driver>) {
        debug!(driver = driver.name(), "driver registered");
        self.drivers.insert(driver.name().to_string(), driver);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers.get(name).cloned()
    }

    /// Find the driver called `name` and check that it accepts `url`.
    pub fn resolve(&self, name: &str, url: &str) -> Result<Arc<dyn Driver>, ConnectionInitError> {
        let driver = self
            .get(name)
            .ok_or_else(|| ConnectionInitError::DriverNotFound(name.to_string()))?;
        if !driver.accepts_url(url) {
            return Err(ConnectionInitError::UrlRejected {
                driver: name.to_string(),
                url: url.to_string(),
            });
        }
        Ok(driver)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.drivers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// The driver registry and naming service a manager resolves against.
#[derive(Debug, Clone)]
pub struct Backends {
    pub drivers: DriverRegistry,
    pub naming: Arc<dyn NamingService>,
}

impl Backends {
    pub fn new(drivers: DriverRegistry, naming: Arc<dyn NamingService>) -> Self {
        Self { drivers, naming }
    }
}

impl Default for Backends {
    /// Built-in drivers and an empty naming directory.
    fn default() -> Self {
        Self::new(DriverRegistry::with_defaults(), Arc::new(NamingDirectory::new()))
    }
}
