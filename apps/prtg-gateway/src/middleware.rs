//! 请求上下文中间件

use axum::{body::Body, extract::Request, http::HeaderValue, middleware::Next, response::Response};
use prtg_telemetry::new_request_ids;
use tracing::{Instrument, info_span};

/// 注入 request_id/trace_id，并回写到响应头。
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    // 路径里带 webhook 令牌，日志只记录前缀。
    let path = redact_hook_path(req.uri().path());
    req.extensions_mut().insert(ids.clone());

    let span = info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}

fn redact_hook_path(path: &str) -> String {
    match path.strip_prefix("/hook/prtg/") {
        Some(_) => "/hook/prtg/***".to_string(),
        None => path.to_string(),
    }
}
