use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level project configuration loaded from `.oair.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OairConfig {
    pub naming: NamingConfig,
    pub services: ServicesConfig,
}

/// Endpoint naming strategy and aliases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub strategy: NamingStrategy,
    /// Map from resolved endpoint name (operationId or route-derived) to custom alias.
    #[serde(default)]
    pub aliases: IndexMap<String, String>,
}

/// How endpoint names are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    /// `operationId` when present, otherwise synthesized from method and path.
    #[default]
    UseOperationId,
    /// Always synthesize from method and path.
    UseRouteBased,
}

/// Service grouping options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Service that receives endpoints without tags.
    pub default_name: String,
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".oair.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<OairConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# oair configuration
naming:
  strategy: use_operation_id  # use_operation_id | use_route_based
  aliases: {}
    # getPetById: getPet     # endpoint name -> custom name

services:
  default_name: ""            # service for endpoints without tags
"#
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = OairConfig::default();
        assert_eq!(config.naming.strategy, NamingStrategy::UseOperationId);
        assert!(config.naming.aliases.is_empty());
        assert_eq!(config.services.default_name, "");
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
naming:
  strategy: use_route_based
  aliases:
    getPetById: getPet
    listPets: pets
services:
  default_name: misc
"#;
        let config: OairConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.naming.strategy, NamingStrategy::UseRouteBased);
        assert_eq!(config.naming.aliases.len(), 2);
        assert_eq!(config.naming.aliases["getPetById"], "getPet");
        assert_eq!(config.services.default_name, "misc");
    }

    #[test]
    fn test_default_content_parses() {
        let config: OairConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config.naming.strategy, NamingStrategy::UseOperationId);
        assert_eq!(config.services.default_name, "");
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "services:\n  default_name: default").unwrap();
        let config = load_config(file.path()).unwrap().unwrap();
        assert_eq!(config.services.default_name, "default");
        assert_eq!(config.naming.strategy, NamingStrategy::UseOperationId);
    }

    #[test]
    fn test_load_config_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "naming:\n  strategy: sometimes").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
