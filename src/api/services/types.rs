//! API 响应类型

use serde::{Deserialize, Serialize};

use crate::storage::models::VisitorRecord;

/// API 错误码
///
/// 按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 访客错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    BadRequest = 1000,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1030,

    VisitorIsBot = 2000,
    VisitorStorageError = 2001,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// 统一 JSON 响应包装
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// `GET /visit` 响应数据
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VisitResponse {
    pub visitor_id: Option<i64>,
    pub token: Option<String>,
    /// RFC 3339
    pub first_visit: String,
    pub is_bot: bool,
    pub is_new: bool,
}

/// `GET /visitor` 响应数据
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VisitorResponse {
    pub is_new: bool,
    pub visitor: VisitorRecord,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthStorageCheck {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitors_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthChecks {
    pub storage: HealthStorageCheck,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u32,
    pub uptime_human: String,
    pub checks: HealthChecks,
    pub response_time_ms: u32,
}
