//! ConfigManager: local properties files layered over a remote table.
//!
//! # Tables
//!
//! Two string tables sit behind one [`RwLock`]:
//!
//! - **local**: merged from a `;`-separated list of properties files, later
//!   files overriding earlier ones.
//! - **remote**: the rows of a two-column database table, loaded only when
//!   the local table switches it on (see [`crate::keys`]).
//!
//! Lookups trim the name, check local first, then remote, and trim the
//! value they return.
//!
//! # Locking
//!
//! Readers share the lock. Init, reload and save hold it exclusively for
//! their whole run, database round trip included, and build replacement
//! tables on the side. The tables are swapped in only when everything
//! succeeded, so a reader sees either the old or the new snapshot and a
//! failed reload leaves the previous tables in place.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use infra_core::{Properties, TempFilesManager};
use infra_db::{
    Backends, ConnectionManager, ConnectionStrategy, DataSourceStrategy, DirectStrategy, Statement,
    TableRef,
};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult, ParseError};
use crate::keys;
use crate::options::ConfigOptions;
use crate::value::FromParam;

/// Lifecycle of a [`ConfigManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
    Reloading = 3,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Phase::Initializing,
            2 => Phase::Ready,
            3 => Phase::Reloading,
            _ => Phase::Uninitialized,
        }
    }
}

/// Where the remote table came from; kept for saving back.
#[derive(Debug)]
struct RemoteSource {
    connections: ConnectionManager,
    table: TableRef,
}

#[derive(Debug, Default)]
struct Tables {
    local: Properties,
    files: Vec<PathBuf>,
    remote: BTreeMap<String, String>,
    source: Option<RemoteSource>,
}

/// A freshly loaded remote table, not yet swapped in.
struct RemoteSnapshot {
    params: BTreeMap<String, String>,
    source: Option<RemoteSource>,
}

/// Process configuration store. `Send + Sync`; share it behind an `Arc`.
#[derive(Debug)]
pub struct ConfigManager {
    options: ConfigOptions,
    backends: Backends,
    tables: RwLock<Tables>,
    phase: AtomicU8,
}

impl ConfigManager {
    /// An uninitialized manager. Nothing is loaded until [`Self::init`].
    pub fn new(options: ConfigOptions, backends: Backends) -> Self {
        Self {
            options,
            backends,
            tables: RwLock::new(Tables::default()),
            phase: AtomicU8::new(Phase::Uninitialized as u8),
        }
    }

    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    // Tables are only ever replaced whole, so a panic under the lock cannot
    // leave them half-written and a poisoned lock is safe to reuse.
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `op` under the write lock as an init/reload step, tracking the
    /// phase around it.
    fn transition<T>(&self, op: impl FnOnce(&mut Tables) -> ConfigResult<T>) -> ConfigResult<T> {
        let mut tables = self.write();
        let before = self.phase();
        let during = match before {
            Phase::Uninitialized | Phase::Initializing => Phase::Initializing,
            Phase::Ready | Phase::Reloading => Phase::Reloading,
        };
        self.phase.store(during as u8, Ordering::Release);

        let result = op(&mut tables);
        let after = match (&result, during) {
            (Ok(_), _) => Phase::Ready,
            (Err(_), Phase::Initializing) => Phase::Uninitialized,
            (Err(_), _) => Phase::Ready,
        };
        self.phase.store(after as u8, Ordering::Release);
        result
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Load the local files, then the remote table. Both tables are
    /// replaced together, or neither is.
    pub fn init(&self) -> ConfigResult<()> {
        self.transition(|tables| {
            let (local, files) = self.load_local()?;
            let remote = self.load_remote(&local)?;

            info!(
                local = local.len(),
                remote = remote.params.len(),
                files = files.len(),
                "configuration loaded"
            );
            tables.local = local;
            tables.files = files;
            tables.remote = remote.params;
            tables.source = remote.source;
            Ok(())
        })
    }

    /// Replace the local table from the configured files. The remote table
    /// is left as it is.
    pub fn init_local(&self) -> ConfigResult<()> {
        self.transition(|tables| {
            let (local, files) = self.load_local()?;
            info!(local = local.len(), files = files.len(), "local configuration loaded");
            tables.local = local;
            tables.files = files;
            Ok(())
        })
    }

    /// Replace the remote table, using the connection settings in the
    /// current local table.
    pub fn init_remote(&self) -> ConfigResult<()> {
        self.transition(|tables| {
            let remote = self.load_remote(&tables.local)?;
            info!(remote = remote.params.len(), "remote configuration loaded");
            tables.remote = remote.params;
            tables.source = remote.source;
            Ok(())
        })
    }

    /// Same as [`Self::init`].
    pub fn reload(&self) -> ConfigResult<()> {
        self.init()
    }

    /// Same as [`Self::init_local`].
    pub fn reload_local(&self) -> ConfigResult<()> {
        self.init_local()
    }

    /// Same as [`Self::init_remote`].
    pub fn reload_remote(&self) -> ConfigResult<()> {
        self.init_remote()
    }

    fn load_local(&self) -> ConfigResult<(Properties, Vec<PathBuf>)> {
        let files = self.options.resolve_local_files()?;
        let mut merged = Properties::new();
        for path in &files {
            let (props, encoding) = Properties::load(path).map_err(|source| {
                warn!(path = %path.display(), error = %source, "local configuration file failed to load");
                ConfigError::LocalFile {
                    path: path.clone(),
                    source,
                }
            })?;
            debug!(path = %path.display(), %encoding, entries = props.len(), "local configuration file read");
            merged.merge(props);
        }
        Ok((merged, files))
    }

    fn load_remote(&self, local: &Properties) -> ConfigResult<RemoteSnapshot> {
        if !toggle(local, keys::LOAD_REMOTE) {
            warn!(key = keys::LOAD_REMOTE, "remote configuration disabled, remote table left empty");
            return Ok(RemoteSnapshot {
                params: BTreeMap::new(),
                source: None,
            });
        }

        let strategy = remote_strategy(local)?;
        debug!(strategy = strategy.kind(), "loading remote configuration");
        let connections = ConnectionManager::new(strategy, &self.backends)?
            .with_connect_timeout(self.options.connect_timeout());
        let table = self.options.remote_table.table_ref();
        let params = select_params(&connections, &table)?;

        Ok(RemoteSnapshot {
            params,
            source: Some(RemoteSource { connections, table }),
        })
    }

    // ── Lookup ───────────────────────────────────────────────────────

    /// Trimmed value of `name`, local table first.
    pub fn get(&self, name: &str) -> Option<String> {
        let name = name.trim();
        let tables = self.read();
        tables
            .local
            .get(name)
            .or_else(|| tables.remote.get(name).map(String::as_str))
            .map(|value| value.trim().to_string())
    }

    /// Parse `name` as `T`. Fails when the parameter is absent or does not
    /// parse.
    pub fn get_as<T: FromParam>(&self, name: &str) -> Result<T, ParseError> {
        let value = self.get(name).ok_or_else(|| ParseError::Missing {
            name: name.trim().to_string(),
        })?;
        parse_value(name, value)
    }

    /// Parse `name` as `T`, or return `default` when it is absent. A present
    /// value that does not parse is still an error.
    pub fn get_or<T: FromParam>(&self, name: &str, default: T) -> Result<T, ParseError> {
        match self.get(name) {
            Some(value) => parse_value(name, value),
            None => Ok(default),
        }
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// `(name, value)` pairs from both tables whose name starts with
    /// `prefix`, ordered by name; `"*"` matches everything. Local values win
    /// over remote ones.
    pub fn params_with_prefix(&self, prefix: &str) -> Vec<(String, String)> {
        let matches = |name: &str| prefix == "*" || name.starts_with(prefix);
        let tables = self.read();

        let mut merged: BTreeMap<&str, &str> = tables
            .remote
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .filter(|&(k, _)| matches(k))
            .collect();
        merged.extend(tables.local.iter().filter(|&(k, _)| matches(k)));

        merged
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    pub fn local_keys(&self) -> Vec<String> {
        self.read().local.keys().map(str::to_string).collect()
    }

    pub fn remote_keys(&self) -> Vec<String> {
        self.read().remote.keys().cloned().collect()
    }

    /// Local files of the last successful local load, in merge order.
    pub fn loaded_files(&self) -> Vec<PathBuf> {
        self.read().files.clone()
    }

    /// Whether the last remote load actually read a database table.
    pub fn remote_enabled(&self) -> bool {
        self.read().source.is_some()
    }

    /// Temp-file manager over the folder named by
    /// `FileManager.tempFolderLocation`.
    pub fn temp_files(&self) -> Result<TempFilesManager, ParseError> {
        let folder: String = self.get_as(keys::TEMP_FOLDER_LOCATION)?;
        Ok(TempFilesManager::new(folder))
    }

    // ── Saving ───────────────────────────────────────────────────────

    /// Update `name` in the remote table, then reload the remote table.
    /// Returns the number of rows the update touched.
    ///
    /// The update and the reload are not one transaction: if the reload
    /// fails the row stays updated while the in-memory table keeps its
    /// old value.
    pub fn save(&self, name: &str, value: &str) -> ConfigResult<u64> {
        let name = name.trim();
        self.transition(|tables| {
            let source = tables.source.as_ref().ok_or(ConfigError::RemoteDisabled)?;

            let statement = Statement::UpdateValue {
                table: source.table.clone(),
                name: name.to_string(),
                value: value.to_string(),
            };
            let affected = execute_update(&source.connections, statement)?;
            if affected == 0 {
                warn!(%name, "no remote parameter row to update");
            } else {
                info!(%name, "remote parameter saved");
            }

            let remote = self.load_remote(&tables.local)?;
            tables.remote = remote.params;
            tables.source = remote.source;
            Ok(affected)
        })
    }
}

fn parse_value<T: FromParam>(name: &str, value: String) -> Result<T, ParseError> {
    T::from_param(&value).ok_or_else(|| ParseError::Invalid {
        name: name.trim().to_string(),
        value,
        expected: T::EXPECTED,
    })
}

fn toggle(local: &Properties, key: &str) -> bool {
    local
        .get(key)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case(keys::TRUE))
}

/// Build the connection strategy the local table asks for, reporting every
/// missing parameter at once.
fn remote_strategy(local: &Properties) -> ConfigResult<ConnectionStrategy> {
    let use_data_source = toggle(local, keys::USE_DATA_SOURCE);
    let (kind, required): (&'static str, &[&'static str]) = if use_data_source {
        ("data-source", keys::DATA_SOURCE_PARAMS.as_slice())
    } else {
        ("direct", keys::DIRECT_PARAMS.as_slice())
    };

    // Credentials are taken verbatim and may be empty; every other
    // parameter is trimmed and must be non-blank.
    let value = |key: &str| {
        let raw = local.get(key)?;
        if keys::CREDENTIAL_PARAMS.iter().any(|&credential| credential == key) {
            return Some(raw.to_string());
        }
        Some(raw.trim()).filter(|v| !v.is_empty()).map(str::to_string)
    };
    let missing: Vec<&'static str> = required
        .iter()
        .copied()
        .filter(|&key| value(key).is_none())
        .collect();
    if !missing.is_empty() {
        warn!(strategy = kind, ?missing, "remote configuration parameters missing");
        return Err(ConfigError::MissingParams {
            strategy: kind,
            missing,
        });
    }

    let get = |key: &str| value(key).unwrap_or_default();
    let strategy = if use_data_source {
        ConnectionStrategy::DataSource(DataSourceStrategy {
            jndi_name: get(keys::DS_JNDI_NAME),
            context_factory: get(keys::DS_CONTEXT_FACTORY),
            provider_url: get(keys::DS_PROVIDER_URL),
        })
    } else {
        ConnectionStrategy::Direct(DirectStrategy {
            driver: get(keys::JDBC_DATABASE_DRIVER),
            url: get(keys::JDBC_DATABASE_URL),
            user: get(keys::JDBC_DATABASE_USER),
            password: get(keys::JDBC_DATABASE_PASS),
        })
    };
    Ok(strategy)
}

/// Read every `(name, value)` row of `table`. Rows with a null column are
/// skipped with a warning.
fn select_params(connections: &ConnectionManager, table: &TableRef) -> ConfigResult<BTreeMap<String, String>> {
    let mut conn = connections.create_connection()?;
    let mut statement = match conn.prepare(Statement::SelectPairs(table.clone())) {
        Ok(statement) => statement,
        Err(e) => {
            ConnectionManager::close_resources(Some(conn), None, None);
            return Err(e.into());
        }
    };
    let mut cursor = match statement.execute_query() {
        Ok(cursor) => cursor,
        Err(e) => {
            ConnectionManager::close_resources(Some(conn), Some(statement), None);
            return Err(e.into());
        }
    };

    let mut params = BTreeMap::new();
    let result: ConfigResult<_> = loop {
        match cursor.next_row() {
            Ok(Some(row)) => match (row.name, row.value) {
                (Some(name), Some(value)) => {
                    debug!(%name, "remote parameter read");
                    params.insert(name, value);
                }
                (name, value) => {
                    warn!(?name, ?value, table = %table.table, "parameter with null name or value skipped");
                }
            },
            Ok(None) => break Ok(params),
            Err(e) => break Err(e.into()),
        }
    };

    ConnectionManager::close_resources(Some(conn), Some(statement), Some(cursor));
    result
}

fn execute_update(connections: &ConnectionManager, statement: Statement) -> ConfigResult<u64> {
    let mut conn = connections.create_connection()?;
    let mut prepared = match conn.prepare(statement) {
        Ok(prepared) => prepared,
        Err(e) => {
            ConnectionManager::close_resources(Some(conn), None, None);
            return Err(e.into());
        }
    };
    let result = prepared.execute_update().map_err(ConfigError::from);
    ConnectionManager::close_resources(Some(conn), Some(prepared), None);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_props(dir: &Path, file: &str, body: &str) -> PathBuf {
        let path = dir.join(file);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn manager_for(files: &[PathBuf]) -> ConfigManager {
        let list = files
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(";");
        ConfigManager::new(ConfigOptions::with_local_files(list), Backends::default())
    }

    #[test]
    fn uninitialized_manager_reports_nothing() {
        let manager = ConfigManager::new(ConfigOptions::default(), Backends::default());
        assert_eq!(manager.phase(), Phase::Uninitialized);
        assert!(!manager.is_present("anything"));
        assert_eq!(manager.get("anything"), None);
        assert!(manager.params_with_prefix("*").is_empty());
    }

    #[test]
    fn later_files_override_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_props(dir.path(), "base.properties", "a=1\nb=2\n");
        let site = write_props(dir.path(), "site.properties", "b: 3\nc = 4\n");

        let manager = manager_for(&[base.clone(), site.clone()]);
        manager.init().unwrap();

        assert_eq!(manager.phase(), Phase::Ready);
        assert_eq!(manager.get("a").as_deref(), Some("1"));
        assert_eq!(manager.get("b").as_deref(), Some("3"));
        assert_eq!(manager.loaded_files(), vec![base, site]);
        assert_eq!(manager.local_keys(), vec!["a", "b", "c"]);
        assert!(!manager.remote_enabled());
    }

    #[test]
    fn names_and_values_are_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_props(dir.path(), "a.properties", "padded = value   \n");
        let manager = manager_for(&[file]);
        manager.init().unwrap();
        assert_eq!(manager.get("  padded ").as_deref(), Some("value"));
    }

    #[test]
    fn typed_access() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_props(dir.path(), "a.properties", "x=42\ny=abc\nflag=TRUE\nratio=0.25\n");
        let manager = manager_for(&[file]);
        manager.init().unwrap();

        assert_eq!(manager.get_as::<i32>("x"), Ok(42));
        assert!(matches!(manager.get_as::<i32>("y"), Err(ParseError::Invalid { .. })));
        assert_eq!(manager.get_or::<i32>("missing", 7), Ok(7));
        assert!(matches!(manager.get_or::<i32>("y", 7), Err(ParseError::Invalid { .. })));
        assert_eq!(
            manager.get_as::<i64>("missing"),
            Err(ParseError::Missing { name: "missing".into() })
        );
        assert_eq!(manager.get_as::<bool>("flag"), Ok(true));
        assert_eq!(manager.get_as::<f64>("ratio"), Ok(0.25));
    }

    #[test]
    fn missing_file_fails_and_keeps_previous_tables() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_props(dir.path(), "a.properties", "k=v\n");
        let manager = manager_for(&[file.clone()]);
        manager.init().unwrap();

        std::fs::remove_file(&file).unwrap();
        let err = manager.reload_local().unwrap_err();
        assert!(matches!(err, ConfigError::LocalFile { .. }));
        assert_eq!(manager.get("k").as_deref(), Some("v"));
        assert_eq!(manager.phase(), Phase::Ready);
    }

    #[test]
    fn failed_first_init_returns_to_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_for(&[dir.path().join("absent.properties")]);
        assert!(manager.init().is_err());
        assert_eq!(manager.phase(), Phase::Uninitialized);
    }

    #[test]
    fn prefix_query_merges_with_local_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_props(dir.path(), "a.properties", "db.url=local\ndb.user=app\nother=1\n");
        let manager = manager_for(&[file]);
        manager.init().unwrap();
        {
            let mut tables = manager.write();
            tables.remote.insert("db.url".into(), "remote".into());
            tables.remote.insert("db.pool".into(), "8".into());
        }

        assert_eq!(
            manager.params_with_prefix("db."),
            vec![
                ("db.pool".to_string(), "8".to_string()),
                ("db.url".to_string(), "local".to_string()),
                ("db.user".to_string(), "app".to_string()),
            ]
        );
        assert_eq!(manager.params_with_prefix("*").len(), 4);
        assert!(manager.params_with_prefix("nope").is_empty());
        assert_eq!(manager.remote_keys(), vec!["db.pool", "db.url"]);
    }

    #[test]
    fn missing_strategy_params_are_all_reported() {
        let local: Properties = [
            (keys::LOAD_REMOTE.to_string(), "true".to_string()),
            (keys::JDBC_DATABASE_DRIVER.to_string(), "  ".to_string()),
            (keys::JDBC_DATABASE_USER.to_string(), "".to_string()),
        ]
        .into_iter()
        .collect();

        match remote_strategy(&local) {
            Err(ConfigError::MissingParams { strategy, missing }) => {
                assert_eq!(strategy, "direct");
                assert_eq!(
                    missing,
                    vec![keys::JDBC_DATABASE_DRIVER, keys::JDBC_DATABASE_URL, keys::JDBC_DATABASE_PASS]
                );
            }
            other => panic!("expected MissingParams, got {other:?}"),
        }
    }

    #[test]
    fn empty_credentials_are_accepted_verbatim() {
        let local: Properties = [
            (keys::JDBC_DATABASE_DRIVER.to_string(), " redb ".to_string()),
            (keys::JDBC_DATABASE_URL.to_string(), "redb:memory:x".to_string()),
            (keys::JDBC_DATABASE_USER.to_string(), "sa".to_string()),
            (keys::JDBC_DATABASE_PASS.to_string(), "".to_string()),
        ]
        .into_iter()
        .collect();

        match remote_strategy(&local) {
            Ok(ConnectionStrategy::Direct(direct)) => {
                assert_eq!(direct.driver, "redb");
                assert_eq!(direct.user, "sa");
                assert_eq!(direct.password, "");
            }
            other => panic!("expected a direct strategy, got {other:?}"),
        }
    }

    #[test]
    fn data_source_toggle_selects_strategy() {
        let local: Properties = [
            (keys::USE_DATA_SOURCE.to_string(), "True".to_string()),
            (keys::DS_JNDI_NAME.to_string(), "jdbc/config".to_string()),
            (keys::DS_CONTEXT_FACTORY.to_string(), "ctx".to_string()),
            (keys::DS_PROVIDER_URL.to_string(), "local://".to_string()),
        ]
        .into_iter()
        .collect();

        let strategy = remote_strategy(&local).unwrap();
        assert_eq!(strategy.kind(), "data-source");
    }

    #[test]
    fn save_without_remote_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_props(dir.path(), "a.properties", "CONFIG_LOAD_REMOTE=false\n");
        let manager = manager_for(&[file]);
        manager.init().unwrap();
        assert!(matches!(manager.save("k", "v"), Err(ConfigError::RemoteDisabled)));
    }

    #[test]
    fn temp_files_need_folder_parameter() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("FileManager.tempFolderLocation={}\n", dir.path().display());
        let file = write_props(dir.path(), "a.properties", &body);
        let manager = manager_for(&[file]);
        manager.init().unwrap();

        let temp = manager.temp_files().unwrap();
        assert_eq!(temp.folder(), dir.path());

        let empty = ConfigManager::new(ConfigOptions::default(), Backends::default());
        assert!(matches!(empty.temp_files(), Err(ParseError::Missing { .. })));
    }
}
