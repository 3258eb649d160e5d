//! Configuration loading tests

use std::io::Write;

use tempfile::NamedTempFile;

use visitrack::config::{SameSitePolicy, StaticConfig, get_config, init_config_with, try_get_config};

fn write_config(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp config");
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_toml_file() {
    let file = write_config(
        r#"
[server]
host = "0.0.0.0"
port = 9000

[database]
database_url = "memory"
table_name = "data.visitor"

[visitor]
hashids_key = "HashidsKey"
hashids_min_length = 8

[visitor.cookie]
name = "my_visitor"
validity = "P1Y"
secure = true
http_only = true
same_site = "Lax"

[visitor.bot]
patterns = ["bot", "preview"]

[proxy]
trusted_proxies = ["10.0.0.0/8"]
"#,
    );

    let config = StaticConfig::load(file.path().to_str()).unwrap();
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.database.table_name, "data.visitor");
    assert_eq!(config.visitor.hashids_min_length, 8);
    assert_eq!(config.visitor.cookie.name, "my_visitor");
    assert_eq!(config.visitor.cookie.same_site, Some(SameSitePolicy::Lax));
    assert_eq!(
        config.visitor.cookie.validity_duration().unwrap(),
        chrono::Duration::days(365)
    );
    assert_eq!(config.visitor.bot.patterns, vec!["bot", "preview"]);
    assert_eq!(config.proxy.trusted_proxies, vec!["10.0.0.0/8"]);
    // 未出现的段落取默认值
    assert_eq!(config.visitor.utm.cookie_name, "utm");
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_missing_key_fails_fast() {
    let file = write_config(
        r#"
[visitor.cookie]
name = "visitor"
"#,
    );
    let err = StaticConfig::load(file.path().to_str()).unwrap_err();
    assert!(err.to_string().contains("hashids_key"));
}

#[test]
fn test_invalid_validity_fails_fast() {
    let file = write_config(
        r#"
[visitor]
hashids_key = "k"

[visitor.cookie]
validity = "forever"
"#,
    );
    assert!(StaticConfig::load(file.path().to_str()).is_err());
}

#[test]
fn test_same_site_none_without_secure_is_rejected() {
    let file = write_config(
        r#"
[visitor]
hashids_key = "k"

[visitor.cookie]
same_site = "None"
"#,
    );
    assert!(StaticConfig::load(file.path().to_str()).is_err());
}

#[test]
fn test_global_config_install() {
    let mut config = StaticConfig::default();
    config.visitor.hashids_key = "global".to_string();
    init_config_with(config);

    assert!(try_get_config().is_some());
    assert_eq!(get_config().visitor.hashids_key, "global");
}
