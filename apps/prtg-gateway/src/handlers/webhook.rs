//! PRTG Webhook 入口。
//!
//! - ANY /hook/prtg/:token（令牌不匹配一律 404）

use crate::AppState;
use crate::utils::response::{not_found_error, webhook_response};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, Method},
    response::Response,
};
use prtg_webhook::{DIAGNOSTICS_HEADER, WebhookMethod, WebhookRequest};
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;
use tracing::warn;

pub async fn prtg_hook(
    State(state): State<AppState>,
    Path(token): Path<String>,
    method: Method,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !token_matches(&token, &state.webhook_token) {
        warn!(target: "prtg.webhook", "webhook_token_mismatch");
        return not_found_error();
    }

    let method = match method {
        Method::GET => WebhookMethod::Get,
        Method::POST => WebhookMethod::Post,
        _ => WebhookMethod::Other,
    };
    let request = WebhookRequest {
        method,
        query,
        diagnostics: headers.contains_key(DIAGNOSTICS_HEADER.to_ascii_lowercase().as_str()),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    webhook_response(state.dispatcher.handle(request).await)
}

/// 常量时间比较，避免按耗时猜测令牌。
pub fn token_matches(candidate: &str, expected: &str) -> bool {
    bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::token_matches;

    #[test]
    fn token_compare() {
        assert!(token_matches("abc", "abc"));
        assert!(!token_matches("abd", "abc"));
        assert!(!token_matches("ab", "abc"));
        assert!(!token_matches("", "abc"));
    }
}
