use crate::core::loader::ParseMode;
use crate::core::strategy::{DimensionFields, DimensionStrategy, FlagStrategy};
use crate::domain::model::ServerKind;
use crate::domain::ports::FieldUpdateStrategy;
use crate::utils::error::{Result, UpdaterError};
use crate::utils::validation::{validate_non_empty_string, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub update: UpdateConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default)]
    pub mode: ParseMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub server_kind: Option<ServerKind>,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Which remote fields a record changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum UpdateConfig {
    /// Numeric CSV columns written to the mapped fields.
    Dimensions(DimensionFields),
    /// Fixed values set on every item regardless of the CSV columns.
    Flags { fields: BTreeMap<String, Value> },
}

impl Default for UpdateConfig {
    fn default() -> Self {
        UpdateConfig::Dimensions(DimensionFields::default())
    }
}

impl UpdateConfig {
    pub fn strategy(&self) -> Box<dyn FieldUpdateStrategy> {
        match self {
            UpdateConfig::Dimensions(fields) => Box::new(DimensionStrategy::new(fields.clone())),
            UpdateConfig::Flags { fields } => Box::new(FlagStrategy::new(fields.clone())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UpdateConfig::Dimensions(_) => "dimensions",
            UpdateConfig::Flags { .. } => "flags",
        }
    }
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|source| UpdaterError::InputFileError {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| UpdaterError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| UpdaterError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        match &self.update {
            UpdateConfig::Dimensions(fields) => {
                validate_non_empty_string("update.length", &fields.length)?;
                validate_non_empty_string("update.width", &fields.width)?;
                validate_non_empty_string("update.height", &fields.height)?;
                validate_non_empty_string("update.weight", &fields.weight)?;
            }
            UpdateConfig::Flags { fields } => {
                if fields.is_empty() {
                    return Err(UpdaterError::ConfigValidationError {
                        field: "update.fields".to_string(),
                        message: "the flags strategy needs at least one field".to_string(),
                    });
                }
                for name in fields.keys() {
                    validate_non_empty_string("update.fields", name)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.update.name(), "dimensions");
        assert_eq!(config.loader.mode, ParseMode::Lenient);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_dimension_mapping() {
        let toml_content = r#"
[loader]
mode = "strict"

[connection]
server_kind = "hana"
accept_invalid_certs = true

[update]
strategy = "dimensions"
length = "U_PackLength"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.loader.mode, ParseMode::Strict);
        assert_eq!(config.connection.server_kind, Some(ServerKind::Hana));
        assert!(config.connection.accept_invalid_certs);
        match &config.update {
            UpdateConfig::Dimensions(fields) => {
                assert_eq!(fields.length, "U_PackLength");
                assert_eq!(fields.width, "SalesUnitWidth1");
            }
            other => panic!("expected dimensions, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_flags() {
        let toml_content = r#"
[update]
strategy = "flags"
fields = { U_ShowOnWeb = "Y", U_WebSync = "Y" }
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        match &config.update {
            UpdateConfig::Flags { fields } => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields.get("U_ShowOnWeb"), Some(&json!("Y")));
            }
            other => panic!("expected flags, got {:?}", other),
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_flags_fail_validation() {
        let toml_content = r#"
[update]
strategy = "flags"
fields = {}
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_field_name_fails_validation() {
        let toml_content = r#"
[update]
strategy = "dimensions"
weight = "  "
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let toml_content = r#"
[update]
strategy = "prices"
"#;

        assert!(matches!(
            TomlConfig::from_toml_str(toml_content),
            Err(UpdaterError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("IMU_TEST_FLAG_FIELD", "U_Visible");

        let toml_content = r#"
[update]
strategy = "flags"
fields = { "${IMU_TEST_FLAG_FIELD}" = "Y" }
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        match &config.update {
            UpdateConfig::Flags { fields } => assert!(fields.contains_key("U_Visible")),
            other => panic!("expected flags, got {:?}", other),
        }

        std::env::remove_var("IMU_TEST_FLAG_FIELD");
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[loader]\nmode = \"strict\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.loader.mode, ParseMode::Strict);
    }
}
