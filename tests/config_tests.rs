//! Configuration loading tests

use scim_sim::config::{
    AccessLevel, ActionPermission, LogFormat, load_config, load_config_from_str,
};
use scim_sim::error::ConfigError;
use scim_sim::scim::models::DEFAULT_BASE_URL;

const FULL_CONFIG: &str = r#"
[server]
name = "scim-sim-test"
version = "0.2.0"

[scim]
base_url = "https://scim.company.com/v2/"
seed_file = "/tmp/seed-users.json"
enforce_self_deactivation = false
enforce_sso_domain = true

[access_control]
all = "read"
deny = ["deactivate_.*"]
allow = ["update_scim_user_by_id"]

[access_control.actions]
create_scim_user = "allow"
replace_scim_user_by_id = "deny"

[logging]
level = "debug"
format = "json"
"#;

#[test]
fn test_empty_config_uses_defaults() {
    let config = load_config_from_str("").unwrap();

    assert_eq!(config.server.name, "scim-sim");
    assert_eq!(config.scim.base_url, DEFAULT_BASE_URL);
    assert!(config.scim.seed_file.is_none());
    assert!(config.scim.enforce_self_deactivation);
    assert!(config.scim.enforce_sso_domain);
    assert_eq!(config.access_control.all, AccessLevel::Full);
    assert!(config.access_control.deny.is_empty());
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn test_full_config() {
    let config = load_config_from_str(FULL_CONFIG).unwrap();

    assert_eq!(config.server.name, "scim-sim-test");
    assert_eq!(config.server.version, "0.2.0");
    assert_eq!(config.scim.base_url, "https://scim.company.com/v2/");
    assert_eq!(config.scim.seed_file.as_deref(), Some("/tmp/seed-users.json"));
    assert!(!config.scim.enforce_self_deactivation);
    assert!(config.scim.enforce_sso_domain);

    let access = &config.access_control;
    assert_eq!(access.all, AccessLevel::Read);
    assert_eq!(access.deny, vec!["deactivate_.*"]);
    assert_eq!(access.allow, vec!["update_scim_user_by_id"]);
    assert_eq!(
        access.actions.get("create_scim_user"),
        Some(&ActionPermission::Allow)
    );
    assert_eq!(
        access.actions.get("replace_scim_user_by_id"),
        Some(&ActionPermission::Deny)
    );

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_blank_seed_file_is_none() {
    let config = load_config_from_str("[scim]\nseed_file = \"  \"\n").unwrap();
    assert!(config.scim.seed_file.is_none());
}

#[test]
fn test_invalid_access_level() {
    let result = load_config_from_str("[access_control]\nall = \"everything\"\n");
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_invalid_base_url() {
    let missing = load_config_from_str("[scim]\nbase_url = \" \"\n");
    assert!(matches!(missing, Err(ConfigError::Missing { field }) if field == "scim.base_url"));

    let scheme = load_config_from_str("[scim]\nbase_url = \"ftp://scim.example.com\"\n");
    assert!(matches!(scheme, Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_invalid_pattern() {
    let result = load_config_from_str("[access_control]\nallow = [\"get_(\"]\n");
    match result {
        Err(ConfigError::InvalidPattern { pattern, reason }) => {
            assert_eq!(pattern, "get_(");
            assert!(reason.contains("access_control.allow"));
        }
        other => panic!("expected an invalid pattern error, got {other:?}"),
    }
}

#[test]
fn test_missing_config_file() {
    let result = load_config(Some("/nonexistent/scim-sim.toml"));
    assert!(matches!(result, Err(ConfigError::Load(msg)) if msg.contains("not found")));
}

#[test]
#[serial_test::serial]
fn test_env_overrides_file() {
    use std::env;
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("scim-sim.toml");
    fs::write(
        &config_path,
        r#"
[scim]
base_url = "https://from-file.example.com/v2"
enforce_sso_domain = true
"#,
    )
    .unwrap();

    unsafe {
        env::set_var("SCIM_SIM_SCIM__BASE_URL", "https://from-env.example.com/v2");
        env::set_var("SCIM_SIM_SCIM__ENFORCE_SSO_DOMAIN", "false");
    }

    let config = load_config(Some(config_path.to_str().unwrap()));

    unsafe {
        env::remove_var("SCIM_SIM_SCIM__BASE_URL");
        env::remove_var("SCIM_SIM_SCIM__ENFORCE_SSO_DOMAIN");
    }

    let config = config.unwrap();
    assert_eq!(config.scim.base_url, "https://from-env.example.com/v2");
    assert!(!config.scim.enforce_sso_domain);
}

#[test]
#[serial_test::serial]
fn test_file_values_without_env() {
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("scim-sim.toml");
    fs::write(&config_path, FULL_CONFIG).unwrap();

    let config = load_config(Some(config_path.to_str().unwrap())).unwrap();
    assert_eq!(config.server.name, "scim-sim-test");
    assert_eq!(config.access_control.all, AccessLevel::Read);
}
