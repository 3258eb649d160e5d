use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{debug, error, trace};

use super::helpers::{error_from_visitrack, error_response, success_response};
use super::types::{ErrorCode, VisitResponse, VisitorResponse};
use crate::api::{ActixCookiePort, UtmCookie, UtmSettings};
use crate::config::StaticConfig;
use crate::errors::Result;
use crate::utils::ip::extract_client_ip;
use crate::visitor::{
    Invocation, RequestContext, Resolution, VisitorResolver, VisitorSession, VisitorStore,
};

/// 处理函数共享的应用状态
#[derive(Clone)]
pub struct AppState {
    pub resolver: VisitorResolver,
    pub utm: UtmSettings,
    pub trusted_proxies: Arc<Vec<String>>,
}

impl AppState {
    pub fn from_config(config: &StaticConfig, store: Arc<dyn VisitorStore>) -> Result<Self> {
        Ok(Self {
            resolver: VisitorResolver::from_config(&config.visitor, store)?,
            utm: UtmSettings::from_config(&config.visitor.utm)?,
            trusted_proxies: Arc::new(config.proxy.trusted_proxies.clone()),
        })
    }
}

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// 从 HTTP 请求构建访客上下文
///
/// 主机名取客户端 IP，请求路径上不做反向 DNS 解析。
pub fn request_context(req: &HttpRequest, trusted_proxies: &[String]) -> RequestContext {
    let ip_address = extract_client_ip(req, trusted_proxies);
    RequestContext {
        invocation: Invocation::Http,
        hostname: ip_address.clone(),
        ip_address,
        request_uri: Some(req.uri().to_string()),
        http_referer: header(req, "referer"),
        remote_port: req.peer_addr().map(|addr| addr.port().to_string()),
        user_agent: header(req, "user-agent"),
    }
}

fn campaign_for(
    req: &HttpRequest,
    state: &AppState,
    ctx: &RequestContext,
    cookies: &ActixCookiePort,
) -> UtmCookie {
    // 爬虫请求不下发任何 cookie
    if state.resolver.bots().is_bot(ctx) {
        return UtmCookie::default();
    }
    UtmCookie::capture(req.query_string(), cookies, &state.utm)
}

/// 记录访问并汇总会话结果
async fn record_and_describe(session: &VisitorSession<'_>) -> Result<VisitResponse> {
    session.record_visit().await?;
    let resolution = session.resolution().await?;
    Ok(VisitResponse {
        visitor_id: resolution.visitor_id(),
        token: resolution.token().map(str::to_string),
        first_visit: session.first_visit_at().await?.to_rfc3339(),
        is_bot: resolution.is_bot(),
        is_new: resolution.is_new(),
    })
}

pub struct VisitorService;

impl VisitorService {
    /// 识别访客并记录本次访问
    pub async fn visit(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
        trace!("Received visit request: {}", req.uri());
        let ctx = request_context(&req, &state.trusted_proxies);
        let cookies = ActixCookiePort::from_request(&req);
        let campaign = campaign_for(&req, &state, &ctx, &cookies);
        let session = state.resolver.session(ctx, &cookies, &campaign);

        let result = record_and_describe(&session).await;

        match result {
            Ok(data) => {
                debug!(
                    "Visit recorded: visitor={:?} new={} bot={}",
                    data.visitor_id, data.is_new, data.is_bot
                );
                let mut response = success_response(data);
                cookies.apply(&mut response);
                response
            }
            Err(e) => {
                error!("Visitor resolution failed: {}", e);
                error_from_visitrack(&e)
            }
        }
    }

    /// 只识别访客，不记录访问
    pub async fn get_visitor(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
        trace!("Received visitor lookup request");
        let ctx = request_context(&req, &state.trusted_proxies);
        let cookies = ActixCookiePort::from_request(&req);
        let campaign = campaign_for(&req, &state, &ctx, &cookies);
        let session = state.resolver.session(ctx, &cookies, &campaign);

        match session.resolution().await {
            Ok(Resolution::Bot) => error_response(
                actix_web::http::StatusCode::NOT_FOUND,
                ErrorCode::VisitorIsBot,
                "No visitor is tracked for non-interactive clients",
            ),
            Ok(resolution) => {
                let is_new = resolution.is_new();
                match resolution.record() {
                    Some(record) => {
                        let mut response = success_response(VisitorResponse {
                            is_new,
                            visitor: record.clone(),
                        });
                        cookies.apply(&mut response);
                        response
                    }
                    None => error_response(
                        actix_web::http::StatusCode::NOT_FOUND,
                        ErrorCode::NotFound,
                        "Visitor not found",
                    ),
                }
            }
            Err(e) => {
                error!("Visitor resolution failed: {}", e);
                error_from_visitrack(&e)
            }
        }
    }
}

/// 访客路由配置
pub fn visitor_routes() -> actix_web::Scope {
    web::scope("")
        .route("/visit", web::get().to(VisitorService::visit))
        .route("/visitor", web::get().to(VisitorService::get_visitor))
}
