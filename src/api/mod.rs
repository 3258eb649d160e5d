//! HTTP 集成层
//!
//! - `cookies`: actix-web 上的 `CookiePort` 实现
//! - `utm`: 基于 `utm` cookie 的 `CampaignTagSource`
//! - `services`: 路由与处理函数

pub mod cookies;
pub mod services;
pub mod utm;

pub use cookies::ActixCookiePort;
pub use utm::{UtmCookie, UtmSettings};
