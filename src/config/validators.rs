//! 启动配置校验
//!
//! 所有检查都在处理第一个请求之前完成，任何一项失败都会阻止启动。

use super::{SameSitePolicy, StaticConfig};
use crate::errors::{Result, VisitrackError};

/// token 列为 VARCHAR(255)，最小长度不能超过列宽
pub const MAX_HASHIDS_MIN_LENGTH: usize = 255;

/// 校验完整的静态配置
pub fn validate_static_config(config: &StaticConfig) -> Result<()> {
    let visitor = &config.visitor;

    if visitor.hashids_key.trim().is_empty() {
        return Err(VisitrackError::config(
            "visitor.hashids_key is required (set VT__VISITOR__HASHIDS_KEY or config.toml)",
        ));
    }

    if visitor.hashids_min_length > MAX_HASHIDS_MIN_LENGTH {
        return Err(VisitrackError::config(format!(
            "visitor.hashids_min_length must be at most {}, got {}",
            MAX_HASHIDS_MIN_LENGTH, visitor.hashids_min_length
        )));
    }

    validate_cookie_name("visitor.cookie.name", &visitor.cookie.name)?;
    visitor.cookie.validity_duration()?;

    if visitor.cookie.same_site == Some(SameSitePolicy::None) && !visitor.cookie.secure {
        return Err(VisitrackError::config(
            "visitor.cookie.same_site = \"None\" requires visitor.cookie.secure = true",
        ));
    }

    validate_cookie_name("visitor.utm.cookie_name", &visitor.utm.cookie_name)?;
    visitor.utm.validity_duration()?;

    if visitor.utm.cookie_name == visitor.cookie.name {
        return Err(VisitrackError::config(
            "visitor.utm.cookie_name must differ from visitor.cookie.name",
        ));
    }

    validate_bot_patterns(&visitor.bot.patterns)?;
    validate_table_name(&config.database.table_name)?;

    Ok(())
}

/// Cookie 名不能为空，也不能包含分隔符
pub fn validate_cookie_name(field: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(VisitrackError::config(format!("{} must not be empty", field)));
    }
    if let Some(c) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || "()<>@,;:\\\"/[]?={}".contains(*c))
    {
        return Err(VisitrackError::config(format!(
            "{} contains invalid character {:?}",
            field, c
        )));
    }
    Ok(())
}

pub fn validate_bot_patterns(patterns: &[String]) -> Result<()> {
    if patterns.iter().any(|p| p.trim().is_empty()) {
        // 空串会匹配所有 User-Agent
        return Err(VisitrackError::config(
            "visitor.bot.patterns must not contain empty entries",
        ));
    }
    Ok(())
}

/// 表名只允许 `table` 或 `schema.table`，每段为字母数字下划线
pub fn validate_table_name(name: &str) -> Result<()> {
    let valid_part =
        |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    let ok = match name.split_once('.') {
        Some((schema, table)) => valid_part(schema) && valid_part(table),
        None => valid_part(name),
    };

    if !ok {
        return Err(VisitrackError::config(format!(
            "database.table_name '{}' is invalid, expected 'table' or 'schema.table'",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> StaticConfig {
        let mut config = StaticConfig::default();
        config.visitor.hashids_key = "HashidsKey".to_string();
        config
    }

    #[test]
    fn test_default_with_key_is_valid() {
        assert!(validate_static_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_key_fails() {
        let mut config = valid_config();
        config.visitor.hashids_key = "   ".to_string();
        let err = validate_static_config(&config).unwrap_err();
        assert_eq!(err.code(), "E001");
    }

    #[test]
    fn test_invalid_validity_fails() {
        let mut config = valid_config();
        config.visitor.cookie.validity = "forever".to_string();
        assert!(validate_static_config(&config).is_err());

        let mut config = valid_config();
        config.visitor.utm.validity = "0d".to_string();
        assert!(validate_static_config(&config).is_err());
    }

    #[test]
    fn test_oversized_validity_fails() {
        let mut config = valid_config();
        config.visitor.cookie.validity = "10000y".to_string();
        assert!(validate_static_config(&config).is_err());

        let mut config = valid_config();
        config.visitor.cookie.validity = "P10000Y".to_string();
        assert!(validate_static_config(&config).is_err());

        let mut config = valid_config();
        config.visitor.utm.validity = "101y".to_string();
        assert!(validate_static_config(&config).is_err());

        let mut config = valid_config();
        config.visitor.cookie.validity = "100y".to_string();
        assert!(validate_static_config(&config).is_ok());
    }

    #[test]
    fn test_same_site_none_requires_secure() {
        let mut config = valid_config();
        config.visitor.cookie.same_site = Some(SameSitePolicy::None);
        assert!(validate_static_config(&config).is_err());

        config.visitor.cookie.secure = true;
        assert!(validate_static_config(&config).is_ok());
    }

    #[test]
    fn test_cookie_names() {
        assert!(validate_cookie_name("f", "visitor").is_ok());
        assert!(validate_cookie_name("f", "").is_err());
        assert!(validate_cookie_name("f", "a b").is_err());
        assert!(validate_cookie_name("f", "a;b").is_err());

        let mut config = valid_config();
        config.visitor.utm.cookie_name = "visitor".to_string();
        assert!(validate_static_config(&config).is_err());
    }

    #[test]
    fn test_bot_patterns() {
        assert!(validate_bot_patterns(&["bot".to_string()]).is_ok());
        assert!(validate_bot_patterns(&[]).is_ok());
        assert!(validate_bot_patterns(&["bot".to_string(), " ".to_string()]).is_err());
    }

    #[test]
    fn test_table_names() {
        assert!(validate_table_name("visitor").is_ok());
        assert!(validate_table_name("data.visitor_v2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("visitor; DROP TABLE x").is_err());
        assert!(validate_table_name("a.b.c").is_err());
        assert!(validate_table_name(".visitor").is_err());
    }

    #[test]
    fn test_min_length_upper_bound() {
        let mut config = valid_config();
        config.visitor.hashids_min_length = 256;
        assert!(validate_static_config(&config).is_err());
    }
}
