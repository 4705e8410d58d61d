pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{InMemoryCompany, ServiceLayerCompany};
pub use config::{Settings, TomlConfig, UpdateConfig};
pub use self::core::{
    engine::UpdateEngine,
    loader::{load_items, parse_items, LoadOptions, ParseMode},
    updater::BatchUpdater,
};
pub use utils::error::{Result, UpdaterError};
