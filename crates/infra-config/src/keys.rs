//! Recognized local parameter names.
//!
//! These are read from the local table to decide whether and how the
//! remote table is loaded. Toggles count as on only when their value is
//! `true`, ignoring case; a missing toggle is off.

/// Load the remote table at all.
pub const LOAD_REMOTE: &str = "CONFIG_LOAD_REMOTE";

/// Use a named data source (on) or a direct driver connection (off).
pub const USE_DATA_SOURCE: &str = "CONFIG_USE_DATA_SOURCE";

pub const DS_JNDI_NAME: &str = "CONFIG_DS_JNDI_NAME";
pub const DS_CONTEXT_FACTORY: &str = "CONFIG_DS_CONTEXT_FACTORY";
pub const DS_PROVIDER_URL: &str = "CONFIG_DS_PROVIDER_URL";

pub const JDBC_DATABASE_DRIVER: &str = "CONFIG_JDBC_DATABASE_DRIVER";
pub const JDBC_DATABASE_URL: &str = "CONFIG_JDBC_DATABASE_URL";
pub const JDBC_DATABASE_USER: &str = "CONFIG_JDBC_DATABASE_USER";
pub const JDBC_DATABASE_PASS: &str = "CONFIG_JDBC_DATABASE_PASS";

/// Parameters a data-source strategy needs, in reporting order.
pub const DATA_SOURCE_PARAMS: [&str; 3] = [DS_JNDI_NAME, DS_CONTEXT_FACTORY, DS_PROVIDER_URL];

/// Parameters a direct strategy needs, in reporting order.
pub const DIRECT_PARAMS: [&str; 4] = [
    JDBC_DATABASE_DRIVER,
    JDBC_DATABASE_URL,
    JDBC_DATABASE_USER,
    JDBC_DATABASE_PASS,
];

/// Direct parameters that may be set to an empty value, for accounts
/// without a password.
pub const CREDENTIAL_PARAMS: [&str; 2] = [JDBC_DATABASE_USER, JDBC_DATABASE_PASS];

/// Folder for [`infra_core::TempFilesManager`].
pub const TEMP_FOLDER_LOCATION: &str = "FileManager.tempFolderLocation";

/// Value a toggle must have (ignoring case) to be on.
pub const TRUE: &str = "true";
