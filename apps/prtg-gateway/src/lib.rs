//! PRTG 网关进程：连接、中继、Webhook HTTP 入口与传感器消费者的装配。

pub mod consumers;
pub mod diagnostics;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod utils;

use prtg_connection::GatewayConnection;
use prtg_webhook::WebhookDispatcher;
use std::sync::Arc;

/// HTTP 层共享状态。
#[derive(Clone)]
pub struct AppState {
    pub connection: Arc<GatewayConnection>,
    pub dispatcher: WebhookDispatcher,
    /// Webhook 路径中的实例令牌。
    pub webhook_token: Arc<str>,
}

pub use routes::create_router;
