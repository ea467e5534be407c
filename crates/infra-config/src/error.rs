//! Error types for the configuration manager.

use std::path::PathBuf;

use infra_core::PropertiesError;
use infra_db::{ConnectionError, ConnectionInitError, DbError};
use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failure of an init, reload or save. Never retried internally.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no local configuration files: set {env} or configure local_files")]
    LocalSourceUnset { env: String },

    #[error("cannot load local configuration file {}", path.display())]
    LocalFile {
        path: PathBuf,
        #[source]
        source: PropertiesError,
    },

    #[error("{strategy} connection needs parameters that are not set: {}", missing.join(", "))]
    MissingParams {
        strategy: &'static str,
        missing: Vec<&'static str>,
    },

    #[error("remote configuration is not loaded, nothing to save to")]
    RemoteDisabled,

    #[error("cannot set up the remote configuration connection")]
    ConnectionInit(#[from] ConnectionInitError),

    #[error("cannot connect to the remote configuration database")]
    Connection(#[from] ConnectionError),

    #[error("remote configuration statement failed")]
    Db(#[from] DbError),

    #[error("cannot read options file {}", path.display())]
    OptionsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid options file {}", path.display())]
    OptionsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Typed access to a parameter failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("parameter {name:?} is not set")]
    Missing { name: String },

    #[error("parameter {name:?} = {value:?} is not a valid {expected}")]
    Invalid {
        name: String,
        value: String,
        expected: &'static str,
    },
}
