pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::local_storage::LocalStorage;
pub use crate::config::toml_config::TomlConfig;
pub use crate::core::{
    catalog::CatalogCache, engine::MatcherEngine, mapping::MappingStore, normalize::normalize,
    reconcile::pending_work, search::SearchEngine,
};
pub use crate::utils::error::{MatcherError, Result};
