//! Embedded driver backed by [redb](https://docs.rs/redb).
//!
//! URLs take one of two forms:
//!
//! - `redb:memory:<name>`: an in-memory database, shared by every
//!   connection to the same name through this driver.
//! - `redb:<path>`: a database file, created on first connect.
//!
//! A parameter table maps to a redb table of `&str` names and optional
//! `&str` values, so column names in a [`TableRef`](crate::TableRef) carry
//! no meaning here. Credentials are accepted and not checked.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, TableError};
use tracing::debug;

use crate::backend::{ConnectOptions, Connection, Driver, PreparedStatement, RowCursor, RowsCursor};
use crate::error::{ConnectionError, DbError, DbResult};
use crate::statement::{Row, Statement, TableRef};

/// Convert any `Display` error into a `DbError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| DbError::$variant(e.to_string())
    };
}

pub const DRIVER_NAME: &str = "redb";

const URL_PREFIX: &str = "redb:";
const MEMORY_PREFIX: &str = "memory:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location<'a> {
    Memory(&'a str),
    File(&'a Path),
}

fn parse_url(url: &str) -> Option<Location<'_>> {
    let rest = url.strip_prefix(URL_PREFIX)?;
    match rest.strip_prefix(MEMORY_PREFIX) {
        Some("") => None,
        Some(name) => Some(Location::Memory(name)),
        None if rest.is_empty() => None,
        None => Some(Location::File(Path::new(rest))),
    }
}

fn table_def(table: &TableRef) -> TableDefinition<'_, &'static str, Option<&'static str>> {
    TableDefinition::new(&table.table)
}

/// The built-in `redb` driver. Opened databases are cached per URL for the
/// lifetime of the driver.
#[derive(Default)]
pub struct RedbDriver {
    databases: Mutex<HashMap<String, Arc<Database>>>,
}

impl fmt::Debug for RedbDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open: Vec<String> = match self.databases.lock() {
            Ok(cache) => cache.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        f.debug_struct("RedbDriver").field("open", &open).finish()
    }
}

impl RedbDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn open(&self, url: &str, location: Location<'_>) -> Result<Arc<Database>, ConnectionError> {
        let unreachable = |reason: String| ConnectionError::Unreachable {
            url: url.to_string(),
            reason,
        };

        let mut cache = self
            .databases
            .lock()
            .map_err(|_| unreachable("driver cache lock poisoned".into()))?;
        if let Some(db) = cache.get(url) {
            return Ok(Arc::clone(db));
        }

        let db = match location {
            Location::Memory(_) => {
                Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())
            }
            Location::File(path) => Database::create(path),
        }
        .map_err(|e| unreachable(e.to_string()))?;

        let db = Arc::new(db);
        cache.insert(url.to_string(), Arc::clone(&db));
        debug!(%url, "redb database opened");
        Ok(db)
    }
}

impl Driver for RedbDriver {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    fn accepts_url(&self, url: &str) -> bool {
        parse_url(url).is_some()
    }

    fn connect(&self, url: &str, options: &ConnectOptions) -> Result<Box<dyn Connection>, ConnectionError> {
        let location = parse_url(url).ok_or_else(|| ConnectionError::Unreachable {
            url: url.to_string(),
            reason: "not a redb url".into(),
        })?;
        let db = self.open(url, location)?;
        debug!(
            %url,
            user = options.user.as_deref().unwrap_or_default(),
            timeout = ?options.connect_timeout,
            "redb connection opened"
        );
        Ok(Box::new(RedbConnection {
            db,
            closed: false,
        }))
    }
}

struct RedbConnection {
    db: Arc<Database>,
    closed: bool,
}

impl fmt::Debug for RedbConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedbConnection")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Connection for RedbConnection {
    fn prepare(&mut self, statement: Statement) -> DbResult<Box<dyn PreparedStatement>> {
        if self.closed {
            return Err(DbError::Closed("connection"));
        }
        Ok(Box::new(RedbStatement {
            db: Arc::clone(&self.db),
            statement,
            closed: false,
        }))
    }

    fn close(&mut self) -> DbResult<()> {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

struct RedbStatement {
    db: Arc<Database>,
    statement: Statement,
    closed: bool,
}

impl fmt::Debug for RedbStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedbStatement")
            .field("statement", &self.statement)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

fn table_error(table: &TableRef, err: TableError) -> DbError {
    match err {
        TableError::TableDoesNotExist(_) => DbError::Table(format!("no such table: {}", table.table)),
        other => DbError::Table(other.to_string()),
    }
}

impl RedbStatement {
    fn select(&self, table: &TableRef) -> DbResult<Vec<Row>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let handle = txn.open_table(table_def(table)).map_err(|e| table_error(table, e))?;

        let mut rows = Vec::new();
        for entry in handle.iter().map_err(map_err!(Read))? {
            let (name, value) = entry.map_err(map_err!(Read))?;
            rows.push(Row::new(Some(name.value()), value.value()));
        }
        Ok(rows)
    }

    /// Fail unless `table` exists. Opening a table in a write transaction
    /// would create it.
    fn require_table(&self, table: &TableRef) -> DbResult<()> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        txn.open_table(table_def(table))
            .map(drop)
            .map_err(|e| table_error(table, e))
    }

    fn update(&self, table: &TableRef, name: &str, value: &str) -> DbResult<u64> {
        self.require_table(table)?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let affected = {
            let mut handle = txn.open_table(table_def(table)).map_err(map_err!(Table))?;
            let exists = handle.get(name).map_err(map_err!(Read))?.is_some();
            if exists {
                handle.insert(name, Some(value)).map_err(map_err!(Write))?;
                1
            } else {
                0
            }
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(table = %table.table, %name, affected, "redb update");
        Ok(affected)
    }

    fn insert(&self, table: &TableRef, name: &str, value: Option<&str>) -> DbResult<u64> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut handle = txn.open_table(table_def(table)).map_err(map_err!(Table))?;
            if handle.get(name).map_err(map_err!(Read))?.is_some() {
                return Err(DbError::Write(format!(
                    "duplicate name {name:?} in {}",
                    table.table
                )));
            }
            handle.insert(name, value).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(table = %table.table, %name, "redb insert");
        Ok(1)
    }
}

impl PreparedStatement for RedbStatement {
    fn execute_query(&mut self) -> DbResult<Box<dyn RowCursor>> {
        if self.closed {
            return Err(DbError::Closed("statement"));
        }
        match &self.statement {
            Statement::SelectPairs(table) => Ok(Box::new(RowsCursor::new(self.select(table)?))),
            other => Err(DbError::Unsupported(format!("not a query: {other}"))),
        }
    }

    fn execute_update(&mut self) -> DbResult<u64> {
        if self.closed {
            return Err(DbError::Closed("statement"));
        }
        match &self.statement {
            Statement::UpdateValue { table, name, value } => self.update(table, name, value),
            Statement::InsertPair { table, name, value } => {
                self.insert(table, name, value.as_deref())
            }
            other => Err(DbError::Unsupported(format!("not an update: {other}"))),
        }
    }

    fn close(&mut self) -> DbResult<()> {
        self.closed = true;
        Ok(())
    }
}
