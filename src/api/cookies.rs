//! actix-web cookie 适配

use std::collections::HashMap;

use actix_web::cookie::time::{Duration as CookieDuration, OffsetDateTime};
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse};
use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::config::SameSitePolicy;
use crate::errors::{Result, VisitrackError};
use crate::visitor::{CookiePort, OutgoingCookie};

/// cookie 名中不允许出现的字符
const INVALID_NAME_CHARS: &[char] = &['=', ',', ';', ' ', '\t', '\r', '\n', '\u{0b}', '\u{0c}'];

/// 请求范围的 cookie 端口
///
/// 读取请求携带的 cookie；写出的 cookie 先缓存，在构建响应时通过 `apply` 附加。
/// 同名 cookie 在本请求内写出后，后续读取返回新值。
pub struct ActixCookiePort {
    incoming: HashMap<String, String>,
    pending: Mutex<Vec<Cookie<'static>>>,
}

impl ActixCookiePort {
    pub fn from_request(req: &HttpRequest) -> Self {
        let incoming = match req.cookies() {
            Ok(cookies) => cookies
                .iter()
                .map(|c| (c.name().to_string(), c.value().to_string()))
                .collect(),
            Err(e) => {
                warn!("Failed to parse request cookies: {}", e);
                HashMap::new()
            }
        };
        Self::with_cookies(incoming)
    }

    pub fn with_cookies(incoming: HashMap<String, String>) -> Self {
        Self {
            incoming,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// 已缓存、尚未写入响应的 cookie
    pub fn pending(&self) -> Vec<Cookie<'static>> {
        self.pending.lock().clone()
    }

    /// 将缓存的 cookie 写入响应
    pub fn apply(&self, response: &mut HttpResponse) {
        for cookie in self.pending.lock().drain(..) {
            if let Err(e) = response.add_cookie(&cookie) {
                warn!("Failed to attach cookie {}: {}", cookie.name(), e);
            }
        }
    }
}

fn to_same_site(policy: SameSitePolicy) -> SameSite {
    match policy {
        SameSitePolicy::Strict => SameSite::Strict,
        SameSitePolicy::Lax => SameSite::Lax,
        SameSitePolicy::None => SameSite::None,
    }
}

fn validate(cookie: &OutgoingCookie) -> Result<()> {
    if cookie.name.is_empty() || cookie.name.contains(INVALID_NAME_CHARS) {
        return Err(VisitrackError::validation(format!(
            "Invalid cookie name: {:?}",
            cookie.name
        )));
    }
    if cookie
        .value
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, ';' | ',' | '"' | '\\'))
    {
        return Err(VisitrackError::validation(format!(
            "Invalid value for cookie {}",
            cookie.name
        )));
    }
    Ok(())
}

impl CookiePort for ActixCookiePort {
    fn read(&self, name: &str) -> Option<String> {
        let pending = self.pending.lock();
        if let Some(cookie) = pending.iter().rev().find(|c| c.name() == name) {
            return Some(cookie.value().to_string());
        }
        self.incoming.get(name).cloned()
    }

    fn write(&self, cookie: OutgoingCookie) -> Result<()> {
        validate(&cookie)?;

        let max_age = CookieDuration::seconds(cookie.max_age.num_seconds());
        let expires = OffsetDateTime::now_utc().checked_add(max_age).ok_or_else(|| {
            VisitrackError::validation(format!(
                "Cookie {} validity is out of range",
                cookie.name
            ))
        })?;
        let mut built = Cookie::new(cookie.name, cookie.value);
        built.set_path(cookie.path);
        if let Some(domain) = cookie.domain {
            built.set_domain(domain);
        }
        built.set_secure(cookie.secure);
        built.set_http_only(cookie.http_only);
        if let Some(policy) = cookie.same_site {
            built.set_same_site(to_same_site(policy));
        }
        built.set_max_age(max_age);
        built.set_expires(expires);

        trace!("Queued cookie {}", built.name());
        let mut pending = self.pending.lock();
        pending.retain(|c| c.name() != built.name());
        pending.push(built);
        Ok(())
    }
}
