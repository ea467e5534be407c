//! How a [`crate::ConnectionManager`] obtains connections.

use std::fmt;

/// Exactly one way of reaching the database, fixed for a manager's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStrategy {
    /// Look up a named data source through a naming service.
    DataSource(DataSourceStrategy),
    /// Connect through a registered driver with explicit credentials.
    Direct(DirectStrategy),
}

impl ConnectionStrategy {
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionStrategy::DataSource(_) => "data-source",
            ConnectionStrategy::Direct(_) => "direct",
        }
    }
}

impl From<DataSourceStrategy> for ConnectionStrategy {
    fn from(strategy: DataSourceStrategy) -> Self {
        ConnectionStrategy::DataSource(strategy)
    }
}

impl From<DirectStrategy> for ConnectionStrategy {
    fn from(strategy: DirectStrategy) -> Self {
        ConnectionStrategy::Direct(strategy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceStrategy {
    /// Name the data source is bound under, e.g. `jdbc/config`.
    pub jndi_name: String,
    pub context_factory: String,
    pub provider_url: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct DirectStrategy {
    /// Registered driver name.
    pub driver: String,
    pub url: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for DirectStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectStrategy")
            .field("driver", &self.driver)
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}
