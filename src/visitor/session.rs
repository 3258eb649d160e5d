use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::trace;

use super::ports::{CampaignTagSource, CookiePort, RequestContext};
use super::resolver::{Resolution, VisitorResolver};
use crate::errors::Result;
use crate::storage::models::{VisitorRecord, storage_timestamp};

/// 单个请求范围内的访客会话
///
/// 第一次调用任何查询方法时执行解析，之后复用同一结果；
/// `record_visit` 在一个会话内最多生效一次。
pub struct VisitorSession<'a> {
    resolver: &'a VisitorResolver,
    ctx: RequestContext,
    cookies: &'a dyn CookiePort,
    campaign: &'a dyn CampaignTagSource,
    resolution: OnceCell<Resolution>,
    visit_recorded: OnceCell<()>,
}

impl<'a> VisitorSession<'a> {
    pub(super) fn new(
        resolver: &'a VisitorResolver,
        ctx: RequestContext,
        cookies: &'a dyn CookiePort,
        campaign: &'a dyn CampaignTagSource,
    ) -> Self {
        Self {
            resolver,
            ctx,
            cookies,
            campaign,
            resolution: OnceCell::new(),
            visit_recorded: OnceCell::new(),
        }
    }

    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    /// 只看调用方式与 User-Agent，不触发解析
    pub fn is_bot(&self) -> bool {
        self.resolver.bots().is_bot(&self.ctx)
    }

    pub async fn resolution(&self) -> Result<&Resolution> {
        self.resolution
            .get_or_try_init(|| {
                self.resolver
                    .resolve(&self.ctx, self.cookies, self.campaign, Utc::now())
            })
            .await
    }

    pub async fn resolve_visitor_id(&self) -> Result<Option<i64>> {
        Ok(self.resolution().await?.visitor_id())
    }

    pub async fn token(&self) -> Result<Option<String>> {
        Ok(self.resolution().await?.token().map(str::to_string))
    }

    /// 首次访问时间；没有访客（爬虫）时返回当前时间
    pub async fn first_visit_at(&self) -> Result<DateTime<Utc>> {
        Ok(self
            .resolution()
            .await?
            .record()
            .map(|r| r.created)
            .unwrap_or_else(Utc::now))
    }

    /// 从存储重新读取当前记录（包含本次会话记录的访问）
    pub async fn record(&self) -> Result<Option<VisitorRecord>> {
        match self.resolve_visitor_id().await? {
            Some(id) => self.resolver.store().fetch_by_id(id).await,
            None => Ok(None),
        }
    }

    /// 记录一次访问
    ///
    /// 新建的访客在插入时已计入第一次访问，这里不再重复累加；
    /// 已验证的访客更新 `last_visit` 并将 `visits_count` 加一。
    pub async fn record_visit(&self) -> Result<()> {
        let resolution = self.resolution().await?;
        self.visit_recorded
            .get_or_try_init(|| async {
                match resolution {
                    Resolution::Verified(record) => {
                        let now = storage_timestamp(Utc::now());
                        self.resolver
                            .store()
                            .touch_last_visit(record.visitor_id, now)
                            .await
                    }
                    Resolution::Created(record) => {
                        trace!("Visitor {} already counted at creation", record.visitor_id);
                        Ok(())
                    }
                    Resolution::Bot => Ok(()),
                }
            })
            .await?;
        Ok(())
    }
}
