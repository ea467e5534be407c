//! ConnectionManager: hands out database connections under one strategy.
//!
//! The manager resolves its strategy once, at construction: a data-source
//! strategy is looked up through the naming service, a direct strategy is
//! matched to a registered driver. After that, every
//! [`ConnectionManager::create_connection`] call yields a fresh connection
//! owned by the caller. The manager keeps no connections of its own and
//! never retries.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::backend::{Backends, ConnectOptions, Connection, DataSource, Driver, PreparedStatement, RowCursor};
use crate::error::{ConnectionError, ConnectionInitError};
use crate::strategy::ConnectionStrategy;

enum Source {
    Pooled {
        name: String,
        data_source: Arc<dyn DataSource>,
    },
    Direct {
        driver: Arc<dyn Driver>,
        url: String,
        options: ConnectOptions,
    },
}

pub struct ConnectionManager {
    source: Source,
}

impl ConnectionManager {
    /// Resolve `strategy` against `backends`.
    pub fn new(strategy: ConnectionStrategy, backends: &Backends) -> Result<Self, ConnectionInitError> {
        let source = match strategy {
            ConnectionStrategy::DataSource(ds) => {
                let data_source = backends
                    .naming
                    .lookup(&ds.context_factory, &ds.provider_url, &ds.jndi_name)
                    .inspect_err(|e| warn!(name = %ds.jndi_name, error = %e, "data source lookup failed"))?;
                debug!(name = %ds.jndi_name, provider_url = %ds.provider_url, "data source resolved");
                Source::Pooled {
                    name: ds.jndi_name,
                    data_source,
                }
            }
            ConnectionStrategy::Direct(direct) => {
                let driver = backends
                    .drivers
                    .resolve(&direct.driver, &direct.url)
                    .inspect_err(|e| warn!(driver = %direct.driver, error = %e, "driver resolution failed"))?;
                debug!(driver = %direct.driver, url = %direct.url, "driver resolved");
                Source::Direct {
                    driver,
                    url: direct.url,
                    options: ConnectOptions {
                        user: Some(direct.user),
                        password: Some(direct.password),
                        connect_timeout: None,
                    },
                }
            }
        };
        Ok(Self { source })
    }

    /// Bound the time a direct connect may take. Data sources manage their
    /// own timeouts.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        if let Source::Direct { options, .. } = &mut self.source {
            options.connect_timeout = timeout;
        }
        self
    }

    /// Open a new connection. Failures are returned as-is, not retried.
    pub fn create_connection(&self) -> Result<Box<dyn Connection>, ConnectionError> {
        match &self.source {
            Source::Pooled { name, data_source } => {
                let conn = data_source.connection()?;
                debug!(%name, "connection obtained from data source");
                Ok(conn)
            }
            Source::Direct { driver, url, options } => {
                let conn = driver.connect(url, options)?;
                debug!(driver = driver.name(), %url, "direct connection opened");
                Ok(conn)
            }
        }
    }

    /// Close whichever of the three resources are present, cursor first.
    /// A failure to close one is logged and does not stop the others.
    pub fn close_resources(
        connection: Option<Box<dyn Connection>>,
        statement: Option<Box<dyn PreparedStatement>>,
        cursor: Option<Box<dyn RowCursor>>,
    ) {
        if let Some(mut cursor) = cursor {
            if let Err(e) = cursor.close() {
                warn!(error = %e, "failed to close cursor");
            }
        }
        if let Some(mut statement) = statement {
            if let Err(e) = statement.close() {
                warn!(error = %e, "failed to close statement");
            }
        }
        if let Some(mut connection) = connection {
            if let Err(e) = connection.close() {
                warn!(error = %e, "failed to close connection");
            }
        }
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Pooled { name, .. } => f
                .debug_struct("ConnectionManager")
                .field("data_source", name)
                .finish(),
            Source::Direct { driver, url, .. } => f
                .debug_struct("ConnectionManager")
                .field("driver", &driver.name())
                .field("url", url)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DriverRegistry, NamingService};
    use crate::error::{DbError, DbResult};
    use crate::naming::NamingDirectory;
    use crate::statement::Statement;
    use crate::strategy::{DataSourceStrategy, DirectStrategy};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ── Mock driver and resources ────────────────────────────────────

    /// Records every connect and the options it was given.
    #[derive(Debug, Default)]
    struct RecordingDriver {
        connects: AtomicUsize,
        last_options: Mutex<Option<ConnectOptions>>,
        fail: bool,
    }

    #[derive(Debug)]
    struct NullConnection;

    impl Connection for NullConnection {
        fn prepare(&mut self, _statement: Statement) -> DbResult<Box<dyn PreparedStatement>> {
            Err(DbError::Unsupported("null connection".into()))
        }
        fn close(&mut self) -> DbResult<()> {
            Ok(())
        }
        fn is_closed(&self) -> bool {
            false
        }
    }

    impl Driver for RecordingDriver {
        fn name(&self) -> &str {
            "recording"
        }
        fn accepts_url(&self, url: &str) -> bool {
            url.starts_with("mock:")
        }
        fn connect(&self, url: &str, options: &ConnectOptions) -> Result<Box<dyn Connection>, ConnectionError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut last) = self.last_options.lock() {
                *last = Some(options.clone());
            }
            if self.fail {
                return Err(ConnectionError::Unreachable {
                    url: url.to_string(),
                    reason: "connection refused".into(),
                });
            }
            Ok(Box::new(NullConnection))
        }
    }

    /// A resource whose close either succeeds or fails, counting attempts.
    #[derive(Debug)]
    struct Closable {
        fails: bool,
        closes: Arc<AtomicUsize>,
    }

    impl Closable {
        fn close_once(&mut self) -> DbResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fails {
                Err(DbError::Write("close failed".into()))
            } else {
                Ok(())
            }
        }
    }

    impl Connection for Closable {
        fn prepare(&mut self, _statement: Statement) -> DbResult<Box<dyn PreparedStatement>> {
            Err(DbError::Closed("connection"))
        }
        fn close(&mut self) -> DbResult<()> {
            self.close_once()
        }
        fn is_closed(&self) -> bool {
            self.closes.load(Ordering::SeqCst) > 0
        }
    }

    impl PreparedStatement for Closable {
        fn execute_query(&mut self) -> DbResult<Box<dyn RowCursor>> {
            Err(DbError::Closed("statement"))
        }
        fn execute_update(&mut self) -> DbResult<u64> {
            Err(DbError::Closed("statement"))
        }
        fn close(&mut self) -> DbResult<()> {
            self.close_once()
        }
    }

    impl RowCursor for Closable {
        fn next_row(&mut self) -> DbResult<Option<crate::Row>> {
            Err(DbError::Closed("cursor"))
        }
        fn close(&mut self) -> DbResult<()> {
            self.close_once()
        }
    }

    fn backends_with(driver: Arc<RecordingDriver>) -> Backends {
        let mut drivers = DriverRegistry::new();
        drivers.register(driver);
        Backends::new(drivers, Arc::new(NamingDirectory::new()))
    }

    fn direct(driver: &str, url: &str) -> ConnectionStrategy {
        DirectStrategy {
            driver: driver.into(),
            url: url.into(),
            user: "app".into(),
            password: "secret".into(),
        }
        .into()
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn unknown_driver_fails_construction() {
        let backends = backends_with(Arc::new(RecordingDriver::default()));
        let err = ConnectionManager::new(direct("oracle.jdbc.OracleDriver", "mock:db"), &backends).unwrap_err();
        assert_eq!(err, ConnectionInitError::DriverNotFound("oracle.jdbc.OracleDriver".into()));
    }

    #[test]
    fn driver_rejecting_url_fails_construction() {
        let backends = backends_with(Arc::new(RecordingDriver::default()));
        let err = ConnectionManager::new(direct("recording", "postgres://db"), &backends).unwrap_err();
        assert!(matches!(err, ConnectionInitError::UrlRejected { .. }));
    }

    #[test]
    fn unbound_data_source_fails_construction() {
        let naming = Arc::new(NamingDirectory::new());
        naming.register_context_factory("ctx");
        let backends = Backends::new(DriverRegistry::new(), naming);

        let strategy = DataSourceStrategy {
            jndi_name: "jdbc/missing".into(),
            context_factory: "ctx".into(),
            provider_url: "local://".into(),
        };
        let err = ConnectionManager::new(strategy.into(), &backends).unwrap_err();
        assert!(matches!(err, ConnectionInitError::NameNotBound { .. }));
    }

    // ── Connections ──────────────────────────────────────────────────

    #[test]
    fn direct_connect_passes_credentials_and_timeout() {
        let driver = Arc::new(RecordingDriver::default());
        let backends = backends_with(driver.clone());
        let manager = ConnectionManager::new(direct("recording", "mock:db"), &backends)
            .unwrap()
            .with_connect_timeout(Some(Duration::from_millis(250)));

        manager.create_connection().unwrap();
        manager.create_connection().unwrap();
        assert_eq!(driver.connects.load(Ordering::SeqCst), 2);

        let options = driver.last_options.lock().unwrap().clone().unwrap();
        assert_eq!(options.user.as_deref(), Some("app"));
        assert_eq!(options.password.as_deref(), Some("secret"));
        assert_eq!(options.connect_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn connect_failure_is_per_call_and_not_retried() {
        let driver = Arc::new(RecordingDriver {
            fail: true,
            ..Default::default()
        });
        let backends = backends_with(driver.clone());
        let manager = ConnectionManager::new(direct("recording", "mock:down"), &backends).unwrap();

        let err = manager.create_connection().unwrap_err();
        assert!(matches!(err, ConnectionError::Unreachable { .. }));
        assert_eq!(driver.connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn data_source_strategy_uses_bound_source() {
        #[derive(Debug, Default)]
        struct CountingSource(AtomicUsize);

        impl DataSource for CountingSource {
            fn connection(&self) -> Result<Box<dyn Connection>, ConnectionError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(NullConnection))
            }
        }

        let source = Arc::new(CountingSource::default());
        let naming = Arc::new(NamingDirectory::new());
        naming.register_context_factory("ctx");
        naming.bind("local://", "jdbc/config", source.clone());
        assert!(naming.lookup("ctx", "local://", "jdbc/config").is_ok());

        let backends = Backends::new(DriverRegistry::new(), naming);
        let strategy = DataSourceStrategy {
            jndi_name: "jdbc/config".into(),
            context_factory: "ctx".into(),
            provider_url: "local://".into(),
        };
        let manager = ConnectionManager::new(strategy.into(), &backends).unwrap();
        manager.create_connection().unwrap();
        assert_eq!(source.0.load(Ordering::SeqCst), 1);
    }

    // ── close_resources ──────────────────────────────────────────────

    #[test]
    fn close_resources_attempts_every_resource() {
        let closes = Arc::new(AtomicUsize::new(0));
        let make = |fails| Closable {
            fails,
            closes: closes.clone(),
        };

        ConnectionManager::close_resources(
            Some(Box::new(make(false))),
            Some(Box::new(make(true))),
            Some(Box::new(make(true))),
        );
        assert_eq!(closes.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn close_resources_accepts_nothing() {
        ConnectionManager::close_resources(None, None, None);
    }
}
