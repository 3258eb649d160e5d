use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// 统一时间戳精度到秒
///
/// MySQL `timestamp` 只保存到秒，PostgreSQL 保存到微秒；写入前截断，
/// 保证创建时返回的时间与之后读回的一致。
pub fn storage_timestamp(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(0)
}

/// 访客首次访问时记录的 UTM 归因快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
}

/// `utm_*` 列宽（VARCHAR(255)）
pub const MAX_UTM_VALUE_CHARS: usize = 255;

/// 按字符截断到列宽以内
pub fn truncate_utm_value(value: &str) -> &str {
    match value.char_indices().nth(MAX_UTM_VALUE_CHARS) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

impl Attribution {
    /// 各字段截断到可写入的长度
    pub fn truncated(self) -> Self {
        let clamp = |v: Option<String>| v.map(|v| truncate_utm_value(&v).to_string());
        Self {
            utm_source: clamp(self.utm_source),
            utm_medium: clamp(self.utm_medium),
            utm_campaign: clamp(self.utm_campaign),
            utm_term: clamp(self.utm_term),
            utm_content: clamp(self.utm_content),
        }
    }
}

/// 持久化的访客记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitorRecord {
    pub visitor_id: i64,
    /// 创建第二阶段写入，之后不再变化
    pub token: Option<String>,
    pub ip_address: Option<String>,
    pub hostname: Option<String>,
    pub request_uri: Option<String>,
    pub http_referer: Option<String>,
    pub remote_port: Option<String>,
    pub user_agent: Option<String>,
    pub visits_count: i64,
    pub last_visit: DateTime<Utc>,
    pub created: DateTime<Utc>,
    #[serde(flatten)]
    pub attribution: Attribution,
}

/// 新访客的插入数据（描述字段 + 归因字段）
#[derive(Debug, Clone)]
pub struct NewVisitor {
    pub ip_address: Option<String>,
    pub hostname: Option<String>,
    pub request_uri: Option<String>,
    pub http_referer: Option<String>,
    pub remote_port: Option<String>,
    pub user_agent: Option<String>,
    pub attribution: Attribution,
    pub created: DateTime<Utc>,
}

impl NewVisitor {
    /// 首次插入即计为一次访问
    pub fn into_record(self, visitor_id: i64, token: Option<String>) -> VisitorRecord {
        VisitorRecord {
            visitor_id,
            token,
            ip_address: self.ip_address,
            hostname: self.hostname,
            request_uri: self.request_uri,
            http_referer: self.http_referer,
            remote_port: self.remote_port,
            user_agent: self.user_agent,
            visits_count: 1,
            last_visit: self.created,
            created: self.created,
            attribution: self.attribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_storage_timestamp_drops_subseconds() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        let truncated = storage_timestamp(at);
        assert_eq!(truncated.nanosecond(), 0);
        assert_eq!(truncated.timestamp(), at.timestamp());
        assert_eq!(storage_timestamp(truncated), truncated);
    }

    #[test]
    fn test_truncate_utm_value_on_char_boundary() {
        assert_eq!(truncate_utm_value("spring"), "spring");

        let long = "é".repeat(300);
        let cut = truncate_utm_value(&long);
        assert_eq!(cut.chars().count(), MAX_UTM_VALUE_CHARS);

        let attribution = Attribution {
            utm_content: Some("x".repeat(1000)),
            utm_source: Some("mail".to_string()),
            ..Attribution::default()
        }
        .truncated();
        assert_eq!(attribution.utm_content.map(|v| v.len()), Some(MAX_UTM_VALUE_CHARS));
        assert_eq!(attribution.utm_source.as_deref(), Some("mail"));
    }
}
