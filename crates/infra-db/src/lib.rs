//! infra-db: database connection management for the infra crates.
//!
//! A [`ConnectionManager`] is built from a [`ConnectionStrategy`] (look up
//! a named data source, or connect directly through a driver) and a set of
//! [`Backends`]. It hands out caller-owned [`Connection`]s that run typed
//! [`Statement`]s against two-column name/value tables.
//!
//! The built-in [`RedbDriver`] stores tables in embedded redb databases,
//! either in memory or on disk. [`NamingDirectory`] is an in-process
//! naming service for data-source bindings.

pub mod backend;
pub mod error;
pub mod manager;
pub mod naming;
pub mod redb_driver;
pub mod statement;
pub mod strategy;

pub use backend::{
    Backends, ConnectOptions, Connection, DataSource, Driver, DriverRegistry, NamingService,
    PreparedStatement, RowCursor, RowsCursor,
};
pub use error::{ConnectionError, ConnectionInitError, DbError, DbResult};
pub use manager::ConnectionManager;
pub use naming::{DriverDataSource, NamingDirectory};
pub use redb_driver::RedbDriver;
pub use statement::{Row, Statement, TableRef};
pub use strategy::{ConnectionStrategy, DataSourceStrategy, DirectStrategy};
