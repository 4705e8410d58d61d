#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::{TomlConfig, UpdateConfig};

use crate::core::loader::LoadOptions;
use crate::domain::model::ConnectionParams;

/// Everything one run needs, after command line and file are merged.
#[derive(Debug, Clone)]
pub struct Settings {
    pub params: ConnectionParams,
    pub csv_path: String,
    pub load_options: LoadOptions,
    pub accept_invalid_certs: bool,
    pub update: UpdateConfig,
}
