//! ConfigManager options, loadable from TOML.
//!
//! ```toml
//! local_files = "/etc/app/base.properties;/etc/app/site.properties"
//! connect_timeout_ms = 5000
//!
//! [remote_table]
//! name = "CONFIGURATION_PARAMS"
//! name_column = "PARAM_NAME"
//! value_column = "PARAM_VALUE"
//! ```
//!
//! Every field is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use infra_db::TableRef;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Environment variable consulted for the local file list when
/// `local_files` is not set.
pub const DEFAULT_LOCAL_FILES_ENV: &str = "INFRA_CONFIG_LOCAL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOptions {
    /// Semicolon-separated local file list. Takes precedence over
    /// `local_files_env`.
    pub local_files: Option<String>,
    /// Environment variable holding the local file list.
    pub local_files_env: String,
    pub remote_table: RemoteTable,
    /// Bound on opening a direct remote connection.
    pub connect_timeout_ms: Option<u64>,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            local_files: None,
            local_files_env: DEFAULT_LOCAL_FILES_ENV.to_string(),
            remote_table: RemoteTable::default(),
            connect_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteTable {
    pub name: String,
    pub name_column: String,
    pub value_column: String,
}

impl Default for RemoteTable {
    fn default() -> Self {
        Self {
            name: "CONFIGURATION_PARAMS".to_string(),
            name_column: "PARAM_NAME".to_string(),
            value_column: "PARAM_VALUE".to_string(),
        }
    }
}

impl RemoteTable {
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.name, &self.name_column, &self.value_column)
    }
}

impl ConfigOptions {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::OptionsRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::OptionsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Options that read local files from `list` instead of the environment.
    pub fn with_local_files(list: impl Into<String>) -> Self {
        Self {
            local_files: Some(list.into()),
            ..Self::default()
        }
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// The local file list, from `local_files` or else the environment.
    pub fn resolve_local_files(&self) -> ConfigResult<Vec<PathBuf>> {
        self.resolve_local_files_with(|var| std::env::var(var).ok())
    }

    /// Like [`Self::resolve_local_files`], reading variables through `env`.
    pub fn resolve_local_files_with(&self, env: impl Fn(&str) -> Option<String>) -> ConfigResult<Vec<PathBuf>> {
        let list = match &self.local_files {
            Some(list) => Some(list.clone()),
            None => env(&self.local_files_env),
        };
        let files = list.as_deref().map(split_file_list).unwrap_or_default();
        if files.is_empty() {
            return Err(ConfigError::LocalSourceUnset {
                env: self.local_files_env.clone(),
            });
        }
        Ok(files)
    }
}

/// Split a `;`-separated path list, dropping blank entries.
pub fn split_file_list(list: &str) -> Vec<PathBuf> {
    list.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}
