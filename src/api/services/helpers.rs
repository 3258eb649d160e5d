//! API 帮助函数

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

use crate::errors::VisitrackError;

use super::types::{ApiResponse, ErrorCode};

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code.as_i32(),
            message: message.into(),
            data,
        })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 错误到 HTTP 状态码与错误码的映射
pub fn status_for(err: &VisitrackError) -> (StatusCode, ErrorCode) {
    match err {
        VisitrackError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
        VisitrackError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadRequest),
        e if e.is_persistence_failure() => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::VisitorStorageError,
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
        ),
    }
}

/// 从 VisitrackError 构建错误响应
pub fn error_from_visitrack(err: &VisitrackError) -> HttpResponse {
    let (status, code) = status_for(err);
    error_response(status, code, err.message())
}
