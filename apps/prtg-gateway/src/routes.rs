//! 路由定义
//!
//! - 健康检查：/health
//! - Webhook：/hook/prtg/:token（任意方法，先校验令牌，再由分发器处理方法）

use crate::AppState;
use crate::handlers::{health, prtg_hook};
use crate::middleware::request_context;
use axum::{
    Router, middleware,
    routing::{any, get},
};
use tower_http::trace::TraceLayer;

/// 创建完整路由（含追踪中间件）。
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/hook/prtg/:token", any(prtg_hook))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 注入 request_id/trace_id
        .layer(middleware::from_fn(request_context))
}
