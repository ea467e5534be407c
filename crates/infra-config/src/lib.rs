//! infra-config: process configuration from local properties files and a
//! remote database table.
//!
//! ```no_run
//! use infra_config::{ConfigManager, ConfigOptions};
//! use infra_db::Backends;
//!
//! let options = ConfigOptions::with_local_files("/etc/app/app.properties");
//! let config = ConfigManager::new(options, Backends::default());
//! config.init()?;
//! let port: u16 = config.get_or("HTTP_PORT", 8080)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod keys;
pub mod manager;
pub mod options;
pub mod value;

pub use error::{ConfigError, ConfigResult, ParseError};
pub use manager::{ConfigManager, Phase};
pub use options::{ConfigOptions, RemoteTable};
pub use value::FromParam;
