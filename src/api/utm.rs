//! UTM 归因 cookie
//!
//! 请求带有任意 `utm_*` 查询参数时，这组参数整体覆盖之前保存的值，
//! 并以 URL 编码的 JSON 对象写入 `utm` cookie；否则从该 cookie 读回。

use std::collections::{BTreeMap, HashMap};

use actix_web::web;
use strum::IntoEnumIterator;
use tracing::{debug, trace, warn};

use crate::config::UtmConfig;
use crate::errors::Result;
use crate::storage::truncate_utm_value;
use crate::visitor::{CampaignTagSource, CookiePort, OutgoingCookie, UtmKey};

/// UTM cookie 的写出属性
#[derive(Debug, Clone)]
pub struct UtmSettings {
    pub cookie_name: String,
    pub validity: chrono::Duration,
}

impl UtmSettings {
    pub fn from_config(config: &UtmConfig) -> Result<Self> {
        Ok(Self {
            cookie_name: config.cookie_name.clone(),
            validity: config.validity_duration()?,
        })
    }
}

impl Default for UtmSettings {
    fn default() -> Self {
        Self {
            cookie_name: "utm".to_string(),
            validity: chrono::Duration::days(7),
        }
    }
}

/// 当前请求的 UTM 参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtmCookie {
    values: HashMap<UtmKey, String>,
}

impl UtmCookie {
    /// 从查询串捕获 UTM 参数，没有则回退到 cookie
    pub fn capture(query_string: &str, cookies: &dyn CookiePort, settings: &UtmSettings) -> Self {
        let from_query = Self::from_query(query_string);
        if !from_query.is_empty() {
            debug!("Captured {} UTM parameters from query", from_query.values.len());
            from_query.persist(cookies, settings);
            return from_query;
        }

        match cookies.read(&settings.cookie_name) {
            Some(raw) => Self::from_cookie_value(&raw),
            None => Self::default(),
        }
    }

    pub fn from_query(query_string: &str) -> Self {
        let params = match web::Query::<HashMap<String, String>>::from_query(query_string) {
            Ok(params) => params.into_inner(),
            Err(e) => {
                trace!("Ignoring unparsable query string: {}", e);
                return Self::default();
            }
        };

        let values = UtmKey::iter()
            .filter_map(|key| {
                params
                    .get(&key.param_name())
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .map(|v| (key, truncate_utm_value(v).to_string()))
            })
            .collect();
        Self { values }
    }

    /// 解析 cookie 值，格式错误时视为没有 UTM 数据
    pub fn from_cookie_value(raw: &str) -> Self {
        let decoded = match urlencoding::decode(raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                trace!("UTM cookie is not valid UTF-8 after decoding: {}", e);
                return Self::default();
            }
        };
        let map: HashMap<String, String> = match serde_json::from_str(&decoded) {
            Ok(map) => map,
            Err(e) => {
                trace!("UTM cookie is not a JSON object: {}", e);
                return Self::default();
            }
        };

        let values = map
            .into_iter()
            .filter(|(_, v)| !v.is_empty())
            .filter_map(|(k, v)| {
                UtmKey::from_param(&k).map(|key| (key, truncate_utm_value(&v).to_string()))
            })
            .collect();
        Self { values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn cookie_value(&self) -> Result<String> {
        let map: BTreeMap<String, &str> = self
            .values
            .iter()
            .map(|(k, v)| (k.param_name(), v.as_str()))
            .collect();
        let json = serde_json::to_string(&map)?;
        Ok(urlencoding::encode(&json).into_owned())
    }

    fn persist(&self, cookies: &dyn CookiePort, settings: &UtmSettings) {
        let value = match self.cookie_value() {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to serialize UTM cookie: {}", e);
                return;
            }
        };
        let cookie = OutgoingCookie {
            name: settings.cookie_name.clone(),
            value,
            max_age: settings.validity,
            path: "/".to_string(),
            domain: None,
            secure: false,
            http_only: false,
            same_site: None,
        };
        if let Err(e) = cookies.write(cookie) {
            warn!("Failed to write UTM cookie: {}", e);
        }
    }
}

impl CampaignTagSource for UtmCookie {
    fn get(&self, key: UtmKey) -> Option<String> {
        self.values.get(&key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ActixCookiePort;

    #[test]
    fn test_from_query_keeps_known_non_empty_params() {
        let utm = UtmCookie::from_query("utm_source=news&utm_medium=&utm_bogus=x&page=2");
        assert_eq!(utm.get(UtmKey::Source).as_deref(), Some("news"));
        assert_eq!(utm.get(UtmKey::Medium), None);
        assert_eq!(utm.values.len(), 1);
    }

    #[test]
    fn test_capture_persists_query_values() {
        let port = ActixCookiePort::with_cookies(HashMap::new());
        let settings = UtmSettings::default();
        let utm = UtmCookie::capture("utm_source=mail&utm_campaign=spring%20sale", &port, &settings);

        assert_eq!(utm.get(UtmKey::Campaign).as_deref(), Some("spring sale"));
        let written = port.read("utm").unwrap();
        assert_eq!(UtmCookie::from_cookie_value(&written), utm);
    }

    #[test]
    fn test_capture_falls_back_to_cookie() {
        let stored = UtmCookie::from_query("utm_source=ads&utm_term=shoes")
            .cookie_value()
            .unwrap();
        let port = ActixCookiePort::with_cookies(HashMap::from([("utm".into(), stored)]));
        let utm = UtmCookie::capture("page=1", &port, &UtmSettings::default());

        assert_eq!(utm.get(UtmKey::Source).as_deref(), Some("ads"));
        assert_eq!(utm.get(UtmKey::Term).as_deref(), Some("shoes"));
        assert!(port.pending().is_empty());
    }

    #[test]
    fn test_query_overrides_cookie_entirely() {
        let stored = UtmCookie::from_query("utm_source=ads&utm_term=shoes")
            .cookie_value()
            .unwrap();
        let port = ActixCookiePort::with_cookies(HashMap::from([("utm".into(), stored)]));
        let utm = UtmCookie::capture("utm_medium=social", &port, &UtmSettings::default());

        let attribution = utm.attribution();
        assert_eq!(attribution.utm_medium.as_deref(), Some("social"));
        assert_eq!(attribution.utm_source, None);
        assert_eq!(attribution.utm_term, None);
    }

    #[test]
    fn test_long_values_are_capped() {
        let long = "a".repeat(600);
        let utm = UtmCookie::from_query(&format!("utm_content={}&utm_source=ads", long));
        assert_eq!(
            utm.get(UtmKey::Content).map(|v| v.len()),
            Some(crate::storage::MAX_UTM_VALUE_CHARS)
        );
        assert_eq!(utm.get(UtmKey::Source).as_deref(), Some("ads"));

        let raw = urlencoding::encode(&format!("{{\"utm_term\":\"{}\"}}", "ü".repeat(400)))
            .into_owned();
        let from_cookie = UtmCookie::from_cookie_value(&raw);
        assert_eq!(
            from_cookie.get(UtmKey::Term).map(|v| v.chars().count()),
            Some(crate::storage::MAX_UTM_VALUE_CHARS)
        );
    }

    #[test]
    fn test_malformed_cookie_is_ignored() {
        assert!(UtmCookie::from_cookie_value("not-json").is_empty());
        assert!(UtmCookie::from_cookie_value("%7B%22utm_source%22%3A1%7D").is_empty());
    }
}
