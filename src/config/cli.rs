use crate::config::toml_config::TomlConfig;
use crate::config::Settings;
use crate::core::loader::{LoadOptions, ParseMode};
use crate::domain::model::{ConnectionParams, ServerKind};
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};
use clap::Parser;

/// Positional arguments follow the order operators already use; everything
/// optional is a flag.
#[derive(Clone, Parser)]
#[command(name = "item-master-updater")]
#[command(about = "Updates SAP Business One item master data from a CSV file")]
pub struct CliConfig {
    /// CSV file with lines of: item code, length, width, height, weight
    pub csv_path: String,

    /// Service Layer host (`sap01`) or base URL (`https://sap01:50000/b1s/v1`)
    pub server: String,

    pub db_user: String,

    pub db_password: String,

    /// Company database name
    pub company_db: String,

    pub api_user: String,

    pub api_password: String,

    /// Database server type: mssql2012..mssql2019 or hana [default: mssql2016]
    #[arg(long)]
    pub server_kind: Option<ServerKind>,

    /// TOML file selecting the fields to update and other defaults
    #[arg(long)]
    pub config: Option<String>,

    /// Abort on the first malformed CSV line instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Accept self-signed Service Layer certificates
    #[arg(long)]
    pub accept_invalid_certs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Write diagnostics as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    /// Merges the optional TOML file under the command line; flags win.
    pub fn resolve(&self) -> Result<Settings> {
        let file = match &self.config {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path);
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };
        file.validate()?;

        let mode = if self.strict {
            ParseMode::Strict
        } else {
            file.loader.mode
        };

        Ok(Settings {
            params: ConnectionParams {
                server: self.server.trim().to_string(),
                server_kind: self
                    .server_kind
                    .or(file.connection.server_kind)
                    .unwrap_or_default(),
                db_user: self.db_user.clone(),
                db_password: self.db_password.clone(),
                company_db: self.company_db.trim().to_string(),
                api_user: self.api_user.trim().to_string(),
                api_password: self.api_password.clone(),
            },
            csv_path: self.csv_path.clone(),
            load_options: LoadOptions { mode },
            accept_invalid_certs: self.accept_invalid_certs || file.connection.accept_invalid_certs,
            update: file.update,
        })
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("csv_path", &self.csv_path)?;
        validate_non_empty_string("server", &self.server)?;
        validate_non_empty_string("company_db", &self.company_db)?;
        validate_non_empty_string("api_user", &self.api_user)?;
        if let Some(path) = &self.config {
            validate_path("config", path)?;
        }
        Ok(())
    }
}
