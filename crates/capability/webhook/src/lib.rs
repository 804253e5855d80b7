//! # Webhook 分发
//!
//! 处理服务端推送过来的单次 HTTP 调用，要么同步应答，要么广播变更通知，二者不会同时发生。
//!
//! 判定顺序：
//! 1. GET + 图表查询 → 返回图片
//! 2. GET + `SensorID` 头 → 返回自诊断报告
//! 3. 其它 GET → 404
//! 4. POST → 按行广播变更通知

mod diagnostics;
mod registry;

pub use diagnostics::{DiagnosticsSource, NoopDiagnostics};
pub use registry::{ChangeSubscriber, ChannelSubscriber, SubscriberRegistry, SubscriptionId};

use async_trait::async_trait;
use domain::ObjectId;
use prtg_connection::{GatewayConnection, Graph, GraphError, GraphFormat, GraphRange, GraphRequest};
use relay_contract::{BroadcastEnvelope, PushReport};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 自诊断请求的标记头。
pub const DIAGNOSTICS_HEADER: &str = "SensorID";
pub const DEFAULT_BASE_FONT_SIZE: u32 = 10;
pub const DEFAULT_SHOW_LEGEND: u8 = 1;

/// Webhook 错误。
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("subscriber closed")]
    SubscriberClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookMethod {
    Get,
    Post,
    Other,
}

/// 与 HTTP 框架无关的入站请求。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRequest {
    pub method: WebhookMethod,
    pub query: BTreeMap<String, String>,
    /// 是否带有自诊断标记头。
    pub diagnostics: bool,
    pub body: String,
}

impl WebhookRequest {
    pub fn get(query: BTreeMap<String, String>) -> Self {
        Self {
            method: WebhookMethod::Get,
            query,
            diagnostics: false,
            body: String::new(),
        }
    }

    pub fn post(body: impl Into<String>) -> Self {
        Self {
            method: WebhookMethod::Post,
            query: BTreeMap::new(),
            diagnostics: false,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl WebhookResponse {
    pub fn not_found() -> Self {
        Self {
            status: 404,
            content_type: "text/plain; charset=utf-8",
            body: b"Not Found!".to_vec(),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self {
            status: 405,
            content_type: "text/plain; charset=utf-8",
            body: b"Method Not Allowed".to_vec(),
        }
    }

    fn accepted() -> Self {
        Self {
            status: 200,
            content_type: "text/plain; charset=utf-8",
            body: Vec::new(),
        }
    }
}

/// 图表来源抽象。
#[async_trait]
pub trait GraphSource: Send + Sync {
    async fn fetch_graph(&self, request: &GraphRequest) -> Result<Graph, GraphError>;
}

#[async_trait]
impl GraphSource for GatewayConnection {
    async fn fetch_graph(&self, request: &GraphRequest) -> Result<Graph, GraphError> {
        GatewayConnection::fetch_graph(self, request).await
    }
}

/// Webhook 分发器。
#[derive(Clone)]
pub struct WebhookDispatcher {
    graphs: Arc<dyn GraphSource>,
    diagnostics: Arc<dyn DiagnosticsSource>,
    registry: Arc<SubscriberRegistry>,
}

impl WebhookDispatcher {
    pub fn new(
        graphs: Arc<dyn GraphSource>,
        diagnostics: Arc<dyn DiagnosticsSource>,
        registry: Arc<SubscriberRegistry>,
    ) -> Self {
        Self {
            graphs,
            diagnostics,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    pub async fn handle(&self, request: WebhookRequest) -> WebhookResponse {
        prtg_telemetry::record_webhook_event();
        match request.method {
            WebhookMethod::Get => self.handle_get(&request).await,
            WebhookMethod::Post => {
                let delivered = self.handle_post(&request.body);
                debug!(target: "prtg.webhook", delivered, "webhook_post_handled");
                WebhookResponse::accepted()
            }
            WebhookMethod::Other => WebhookResponse::method_not_allowed(),
        }
    }

    async fn handle_get(&self, request: &WebhookRequest) -> WebhookResponse {
        if let Some(graph_request) = parse_graph_query(&request.query) {
            return match self.graphs.fetch_graph(&graph_request).await {
                Ok(graph) => WebhookResponse {
                    status: 200,
                    content_type: graph.content_type,
                    body: graph.bytes,
                },
                Err(err) => {
                    warn!(target: "prtg.webhook", sensor_id = graph_request.sensor_id, error = %err, "graph_fetch_failed");
                    WebhookResponse::not_found()
                }
            };
        }
        if request.diagnostics {
            return self.diagnostics_response();
        }
        debug!(target: "prtg.webhook", "webhook_get_not_found");
        WebhookResponse::not_found()
    }

    fn diagnostics_response(&self) -> WebhookResponse {
        let report = PushReport::new(self.diagnostics.channels());
        match serde_json::to_vec(&report) {
            Ok(body) => WebhookResponse {
                status: 200,
                content_type: "application/json",
                body,
            },
            Err(err) => {
                warn!(target: "prtg.webhook", error = %err, "diagnostics_encode_failed");
                WebhookResponse::not_found()
            }
        }
    }

    /// 按行广播，返回成功投递次数。
    fn handle_post(&self, body: &str) -> usize {
        let ids = parse_changed_ids(body);
        info!(target: "prtg.webhook", count = ids.len(), "webhook_change_event");
        ids.into_iter()
            .map(|id| self.registry.broadcast(BroadcastEnvelope::sensor(id)))
            .sum()
    }
}

/// 百分号解码后按行拆分；无法解析为 ID 的行跳过。
pub fn parse_changed_ids(body: &str) -> Vec<ObjectId> {
    let decoded = match urlencoding::decode(body) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            warn!(target: "prtg.webhook", error = %err, "webhook_body_not_utf8");
            body.to_string()
        }
    };
    decoded
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match line.parse::<ObjectId>() {
            Ok(id) => Some(id),
            Err(_) => {
                debug!(target: "prtg.webhook", line, "webhook_line_skipped");
                None
            }
        })
        .collect()
}

/// 缺少必需参数的查询不视为图表查询。
pub fn parse_graph_query(query: &BTreeMap<String, String>) -> Option<GraphRequest> {
    let format = GraphFormat::parse(query.get("graph")?)?;
    let number = |key: &str| query.get(key).and_then(|value| value.trim().parse::<u64>().ok());
    let sensor_id = query.get("id")?.trim().parse::<ObjectId>().ok()?;
    let range = GraphRange::from_id(u8::try_from(number("graphid")?).ok()?)?;
    let width = u32::try_from(number("width")?).ok()?;
    let height = u32::try_from(number("height")?).ok()?;
    let theme = u8::try_from(number("theme")?).ok()?;
    let base_font_size = number("basefontsize")
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(DEFAULT_BASE_FONT_SIZE);
    let show_legend = number("showlegend")
        .map(|value| u8::from(value != 0))
        .unwrap_or(DEFAULT_SHOW_LEGEND);
    Some(GraphRequest {
        format,
        sensor_id,
        range,
        width,
        height,
        theme,
        base_font_size,
        show_legend,
    })
}
