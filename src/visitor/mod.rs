//! 访客识别
//!
//! cookie 中保存由访客 id 编码得到的 token，每个请求解析为唯一的访客记录，
//! 必要时创建新记录。

mod bot;
pub mod ports;
mod resolver;
mod session;

pub use bot::BotDetector;
pub use ports::{
    CampaignTagSource, CookiePort, Invocation, NoCampaign, OutgoingCookie, RequestContext,
    UtmKey, VisitorStore,
};
pub use resolver::{CookieSettings, Plan, Resolution, VisitorResolver, plan, token_for};
pub use session::VisitorSession;
