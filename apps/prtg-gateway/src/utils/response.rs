//! HTTP 响应辅助函数

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use prtg_webhook::WebhookResponse;

/// 资源未找到（令牌不匹配时也返回它，不暴露路径是否存在）。
pub fn not_found_error() -> Response {
    webhook_response(WebhookResponse::not_found())
}

/// 分发器结果转 HTTP 响应
pub fn webhook_response(response: WebhookResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::NOT_FOUND);
    (
        status,
        [(header::CONTENT_TYPE, response.content_type)],
        response.body,
    )
        .into_response()
}
