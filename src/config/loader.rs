//! Configuration loader with layered sources
//!
//! Precedence, highest first:
//! 1. Environment variables (`SCIM_SIM_*`, `__` separates nested keys)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::access_control::PatternMatcher;
use crate::config::types::AppConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SCIM_SIM";

/// Configuration files tried in order when no path is given
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "scim-sim.toml",
    ".scim-sim.toml",
    "~/.config/scim-sim/config.toml",
    "/etc/scim-sim/config.toml",
];

/// Load configuration from a TOML string only (no files, no environment)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    finish(config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        let expanded = shellexpand::tilde(path);
        if !Path::new(expanded.as_ref()).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
    } else if let Some(found) = DEFAULT_CONFIG_PATHS
        .iter()
        .map(|path| shellexpand::tilde(path))
        .find(|path| Path::new(path.as_ref()).exists())
    {
        builder = builder.add_source(File::new(&found, FileFormat::Toml));
    }

    // e.g. SCIM_SIM_SCIM__BASE_URL -> scim.base_url
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    finish(config)
}

fn finish(config: Config) -> Result<AppConfig, ConfigError> {
    let mut app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    app_config.scim.seed_file = app_config
        .scim
        .seed_file
        .take()
        .filter(|path| !path.trim().is_empty())
        .map(|path| shellexpand::tilde(&path).into_owned());

    validate_config(&app_config)?;
    Ok(app_config)
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let base_url = config.scim.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::Missing {
            field: "scim.base_url".to_string(),
        });
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Invalid {
            message: format!(
                "scim.base_url must start with http:// or https://, got: {}",
                base_url
            ),
        });
    }

    if config.server.name.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "server.name".to_string(),
        });
    }

    PatternMatcher::new("access_control.deny", &config.access_control.deny)?;
    PatternMatcher::new("access_control.allow", &config.access_control.allow)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{AccessLevel, ActionPermission, LogFormat};

    #[test]
    fn test_load_config_from_str_basic() {
        let toml = r#"
[server]
name = "test-server"

[scim]
base_url = "https://scim.example.com/v2"
seed_file = "users.json"
enforce_sso_domain = false

[access_control]
all = "read"

[logging]
format = "json"
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.name, "test-server");
        assert_eq!(config.scim.base_url, "https://scim.example.com/v2");
        assert_eq!(config.scim.seed_file.as_deref(), Some("users.json"));
        assert!(config.scim.enforce_self_deactivation);
        assert!(!config.scim.enforce_sso_domain);
        assert_eq!(config.access_control.all, AccessLevel::Read);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.name, "scim-sim");
        assert_eq!(config.access_control.all, AccessLevel::Full);
    }

    #[test]
    fn test_actions_table() {
        let toml = r#"
[access_control.actions]
deactivate_scim_user_by_id = "deny"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(
            config.access_control.actions.get("deactivate_scim_user_by_id"),
            Some(&ActionPermission::Deny)
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let toml = r#"
[scim]
base_url = "scim.example.com"
"#;
        assert!(matches!(
            load_config_from_str(toml),
            Err(ConfigError::Invalid { .. })
        ));

        let toml = r#"
[scim]
base_url = ""
"#;
        assert!(matches!(
            load_config_from_str(toml),
            Err(ConfigError::Missing { .. })
        ));
    }

    #[test]
    fn test_invalid_regex_pattern() {
        let mut config = AppConfig::default();
        config.access_control.deny = vec!["[invalid".to_string()];
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_blank_seed_file_is_none() {
        let toml = r#"
[scim]
seed_file = "  "
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(config.scim.seed_file.is_none());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = load_config(Some("/nonexistent/scim-sim.toml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
