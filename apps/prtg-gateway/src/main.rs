//! PRTG 网关：建立会话、提供 Webhook 入口、驱动传感器消费者。

use prtg_config::GatewayConfig;
use prtg_connection::{GatewayConnection, ReqwestTransport};
use prtg_gateway::consumers::spawn_sensor_consumers;
use prtg_gateway::diagnostics::TelemetryDiagnostics;
use prtg_gateway::{AppState, create_router};
use prtg_relay::RequestRelay;
use prtg_sensor::LoggingSink;
use prtg_telemetry::init_tracing;
use prtg_webhook::{SubscriberRegistry, WebhookDispatcher};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = GatewayConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    let transport = Arc::new(ReqwestTransport::new(config.timeouts)?);
    let connection = Arc::new(GatewayConnection::with_system_resolver(transport));
    let status_rx = connection.subscribe_status();
    let state = connection.reconfigure(&config.connection).await;
    info!(target: "prtg.connection", state = %state, "gateway_configured");

    let relay = Arc::new(RequestRelay::new(connection.clone()));
    let registry = Arc::new(SubscriberRegistry::new());
    let dispatcher = WebhookDispatcher::new(
        connection.clone(),
        Arc::new(TelemetryDiagnostics::new()),
        registry.clone(),
    );

    // 未配置令牌时每次启动随机生成
    let webhook_token = config
        .webhook_token
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    info!(target: "prtg.webhook", path = %format!("/hook/prtg/{}", webhook_token), "webhook_path");

    let _consumers = spawn_sensor_consumers(
        &config.sensor_ids,
        config.interval_seconds,
        relay,
        Arc::new(LoggingSink),
        &registry,
        status_rx,
    );

    let app = create_router(AppState {
        connection,
        dispatcher,
        webhook_token: Arc::from(webhook_token),
    });

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(addr = %config.http_addr, "http_listening");
    axum::serve(listener, app).await?;
    Ok(())
}
