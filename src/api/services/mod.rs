pub mod health;
pub mod helpers;
pub mod types;
pub mod visitor;

pub use health::{AppStartTime, HealthService, health_routes};
pub use types::{ApiResponse, ErrorCode, VisitResponse, VisitorResponse};
pub use visitor::{AppState, VisitorService, request_context, visitor_routes};
