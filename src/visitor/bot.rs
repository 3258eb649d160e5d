use super::ports::{Invocation, RequestContext};
use crate::config::default_bot_patterns;

/// 基于 User-Agent 子串的爬虫识别
///
/// 匹配大小写不敏感；列表来自配置，可在不改代码的情况下扩展。
#[derive(Debug, Clone)]
pub struct BotDetector {
    patterns: Vec<String>,
}

impl Default for BotDetector {
    fn default() -> Self {
        Self::new(default_bot_patterns())
    }
}

impl BotDetector {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { patterns }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// 缺少 User-Agent 不视为爬虫
    pub fn matches_user_agent(&self, user_agent: Option<&str>) -> bool {
        let Some(ua) = user_agent else {
            return false;
        };
        let ua = ua.to_lowercase();
        self.patterns.iter().any(|p| ua.contains(p.as_str()))
    }

    /// CLI 调用一律视为非交互客户端
    pub fn is_bot(&self, ctx: &RequestContext) -> bool {
        ctx.invocation == Invocation::Cli || self.matches_user_agent(ctx.user_agent.as_deref())
    }
}
