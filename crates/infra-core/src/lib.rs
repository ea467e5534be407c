//! infra-core: small reusable building blocks shared by the infra crates.
//!
//! # Contents
//!
//! - [`history::HistoryMap`]: a map that remembers when each binding was
//!   inserted, with time-window queries and oldest/latest eviction.
//! - [`stack::LimitedStack`]: a LIFO stack that forgets its oldest items
//!   once a size limit is reached.
//! - [`pair`]: ordered key/value pairs, optionally with named sides.
//! - [`properties`]: reader for `key=value` / `key: value` property files,
//!   UTF-8 with a Latin-1 fallback.
//! - [`colors`]: ARGB integer ⇄ hex / HTML color conversions.
//! - [`tempfiles::TempFilesManager`]: flat folder for temporary files.
//!
//! None of these types synchronize internally. Share them across threads
//! behind a lock.

pub mod colors;
pub mod error;
pub mod history;
pub mod pair;
pub mod properties;
pub mod stack;
pub mod tempfiles;

pub use colors::Argb;
pub use error::{ColorError, FileError, FileResult, PropertiesError};
pub use history::{Clock, HistoryEntry, HistoryMap, SystemClock, Timestamp};
pub use pair::{KeyValuePair, Tagged, TaggedPair};
pub use properties::{Encoding, Properties};
pub use stack::LimitedStack;
pub use tempfiles::TempFilesManager;
