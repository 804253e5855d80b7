//! 追踪、请求 ID 与进程内计数器。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 计数器快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub requests_issued: u64,
    pub requests_short_circuited: u64,
    pub requests_failed: u64,
    pub malformed_responses: u64,
    pub webhook_events: u64,
    pub broadcasts_sent: u64,
    pub broadcasts_dropped: u64,
    pub channels_decoded: u64,
    pub channels_skipped: u64,
    pub reconfigurations: u64,
    pub uptime_seconds: u64,
}

/// 进程内计数器。
pub struct TelemetryMetrics {
    started_at: Instant,
    requests_issued: AtomicU64,
    requests_short_circuited: AtomicU64,
    requests_failed: AtomicU64,
    malformed_responses: AtomicU64,
    webhook_events: AtomicU64,
    broadcasts_sent: AtomicU64,
    broadcasts_dropped: AtomicU64,
    channels_decoded: AtomicU64,
    channels_skipped: AtomicU64,
    reconfigurations: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests_issued: AtomicU64::new(0),
            requests_short_circuited: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            malformed_responses: AtomicU64::new(0),
            webhook_events: AtomicU64::new(0),
            broadcasts_sent: AtomicU64::new(0),
            broadcasts_dropped: AtomicU64::new(0),
            channels_decoded: AtomicU64::new(0),
            channels_skipped: AtomicU64::new(0),
            reconfigurations: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_issued: self.requests_issued.load(Ordering::Relaxed),
            requests_short_circuited: self.requests_short_circuited.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            malformed_responses: self.malformed_responses.load(Ordering::Relaxed),
            webhook_events: self.webhook_events.load(Ordering::Relaxed),
            broadcasts_sent: self.broadcasts_sent.load(Ordering::Relaxed),
            broadcasts_dropped: self.broadcasts_dropped.load(Ordering::Relaxed),
            channels_decoded: self.channels_decoded.load(Ordering::Relaxed),
            channels_skipped: self.channels_skipped.load(Ordering::Relaxed),
            reconfigurations: self.reconfigurations.load(Ordering::Relaxed),
            uptime_seconds: self.started_at.elapsed().as_secs(),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局计数器实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录实际发出的上游请求。
pub fn record_request_issued() {
    metrics().requests_issued.fetch_add(1, Ordering::Relaxed);
}

/// 记录因未连接而被短路的请求。
pub fn record_request_short_circuited() {
    metrics()
        .requests_short_circuited
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录传输失败或 HTTP 错误。
pub fn record_request_failed() {
    metrics().requests_failed.fetch_add(1, Ordering::Relaxed);
}

/// 记录无法解析的响应体。
pub fn record_malformed_response() {
    metrics().malformed_responses.fetch_add(1, Ordering::Relaxed);
}

pub fn record_webhook_event() {
    metrics().webhook_events.fetch_add(1, Ordering::Relaxed);
}

pub fn record_broadcast_sent() {
    metrics().broadcasts_sent.fetch_add(1, Ordering::Relaxed);
}

/// 记录投递失败的通知（订阅者已关闭或拒收）。
pub fn record_broadcast_dropped() {
    metrics().broadcasts_dropped.fetch_add(1, Ordering::Relaxed);
}

pub fn record_channel_decoded() {
    metrics().channels_decoded.fetch_add(1, Ordering::Relaxed);
}

pub fn record_channel_skipped() {
    metrics().channels_skipped.fetch_add(1, Ordering::Relaxed);
}

pub fn record_reconfiguration() {
    metrics().reconfigurations.fetch_add(1, Ordering::Relaxed);
}
