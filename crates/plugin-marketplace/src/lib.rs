//! Plugin marketplace — static catalog browsing, plugin submission with
//! unique slugs, and per-project installations persisted in key-value storage.

#![warn(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod catalog;
pub mod directory;
pub mod persistence;
pub mod service;
pub mod slug;
pub mod storage;

pub use catalog::PluginCatalog;
pub use directory::CompanyDirectory;
pub use persistence::LocalPersistence;
pub use service::PluginService;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
