pub mod dump;
pub mod get;
pub mod save;
pub mod seed;

use std::path::Path;

use anyhow::Context;
use infra_config::{ConfigManager, ConfigOptions};
use infra_db::Backends;
use tracing::debug;

/// Options from `path` (or the defaults), with `local` replacing the local
/// file list when given.
pub fn load_options(path: Option<&Path>, local: Option<&str>) -> anyhow::Result<ConfigOptions> {
    let mut options = match path {
        Some(path) => ConfigOptions::from_file(path)?,
        None => ConfigOptions::default(),
    };
    if let Some(list) = local {
        options.local_files = Some(list.to_string());
    }
    Ok(options)
}

/// A manager over the built-in drivers, initialized.
pub fn open(options: ConfigOptions) -> anyhow::Result<ConfigManager> {
    let config = ConfigManager::new(options, Backends::default());
    config.init().context("configuration failed to load")?;
    debug!(
        files = config.loaded_files().len(),
        remote = config.remote_enabled(),
        "configuration ready"
    );
    Ok(config)
}
