//! 传感器消费者（子消费者）。
//!
//! 每个实例对应服务端的一个传感器对象，只通过序列化后的中继封装与网关交互。

mod parse;

pub use parse::parse_sensor_row;

use domain::{ObjectId, Observation, RequestEnvelope, ResponseEnvelope, SensorState};
use prtg_decode::ChannelDecoder;
use prtg_relay::RelayPort;
use relay_contract::{BroadcastEnvelope, RelayReply, RelayRequest, TargetKind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const TABLE_URI: &str = "api/table.json";
pub const PAUSE_URI: &str = "api/pause.htm";
pub const ACKNOWLEDGE_URI: &str = "api/acknowledgealarm.htm";
pub const SENSOR_COLUMNS: &str = "objid,lastvalue,device,status,name,interval,active";
pub const CHANNEL_COLUMNS: &str = "objid,lastvalue,name";
/// 低于该值的轮询间隔视为关闭轮询。
pub const MIN_POLL_SECONDS: u64 = 5;

/// 传感器消费者错误。
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("encode error: {0}")]
    Encode(String),
    #[error("relay error: code {0}")]
    Relay(u16),
    #[error("invalid reply: {0}")]
    InvalidReply(String),
    #[error("expected exactly one sensor row, got {0}")]
    UnexpectedRows(usize),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("action rejected")]
    Rejected,
}

/// 宿主的状态变量登记表。
pub trait StateSink: Send + Sync {
    fn sensor_state(&self, sensor_id: ObjectId, state: &SensorState);
    fn observations(&self, sensor_id: ObjectId, observations: &[Observation]);
}

/// 只记日志的状态接收方。
#[derive(Debug, Default)]
pub struct LoggingSink;

impl StateSink for LoggingSink {
    fn sensor_state(&self, sensor_id: ObjectId, state: &SensorState) {
        info!(
            target: "prtg.sensor",
            sensor_id,
            name = %state.name,
            device = %state.device,
            status = state.status.label(),
            active = state.active,
            "sensor_state"
        );
    }

    fn observations(&self, sensor_id: ObjectId, observations: &[Observation]) {
        for observation in observations {
            debug!(
                target: "prtg.sensor",
                sensor_id,
                identifier = observation.identifier,
                name = %observation.name,
                value = ?observation.value,
                unit = %observation.unit,
                "channel_value"
            );
        }
    }
}

/// 单个传感器的消费者。
pub struct SensorConsumer {
    sensor_id: ObjectId,
    relay: Arc<dyn RelayPort>,
    sink: Arc<dyn StateSink>,
    decoder: ChannelDecoder,
    interval_override: u64,
    /// 最近一次读到的传感器自身间隔（秒）。
    sensor_interval: AtomicU64,
}

impl SensorConsumer {
    pub fn new(sensor_id: ObjectId, relay: Arc<dyn RelayPort>, sink: Arc<dyn StateSink>) -> Self {
        Self {
            sensor_id,
            relay,
            sink,
            decoder: ChannelDecoder::new(),
            interval_override: 0,
            sensor_interval: AtomicU64::new(0),
        }
    }

    /// 配置的轮询间隔（秒），小于 5 时使用传感器自身的间隔。
    pub fn with_interval_override(mut self, seconds: u64) -> Self {
        self.interval_override = seconds;
        self
    }

    pub fn sensor_id(&self) -> ObjectId {
        self.sensor_id
    }

    /// 当前生效的轮询间隔；None 表示不轮询。
    pub fn polling_interval(&self) -> Option<Duration> {
        let seconds = if self.interval_override >= MIN_POLL_SECONDS {
            self.interval_override
        } else {
            self.sensor_interval.load(Ordering::Relaxed)
        };
        (seconds >= MIN_POLL_SECONDS).then(|| Duration::from_secs(seconds))
    }

    /// 先读传感器状态，成功后再读通道。
    pub async fn request_state(&self) -> Result<(), SensorError> {
        self.request_sensor_state().await?;
        self.request_channel_state().await?;
        Ok(())
    }

    pub async fn request_sensor_state(&self) -> Result<SensorState, SensorError> {
        let request = RequestEnvelope::new(TABLE_URI)
            .param("content", "sensors")
            .param("columns", SENSOR_COLUMNS)
            .param("filter_objid", self.sensor_id);
        let response = self.send(request).await?;
        let rows = response
            .rows("sensors")
            .ok_or(SensorError::MissingField("sensors"))?;
        if rows.len() != 1 {
            return Err(SensorError::UnexpectedRows(rows.len()));
        }
        let state = parse_sensor_row(self.sensor_id, &rows[0])?;

        let previous = self
            .sensor_interval
            .swap(state.interval_seconds, Ordering::Relaxed);
        if previous != state.interval_seconds {
            debug!(target: "prtg.sensor", sensor_id = self.sensor_id, interval = state.interval_seconds, "sensor_interval_changed");
        }
        self.sink.sensor_state(self.sensor_id, &state);
        Ok(state)
    }

    pub async fn request_channel_state(&self) -> Result<Vec<Observation>, SensorError> {
        let request = RequestEnvelope::new(TABLE_URI)
            .param("content", "channels")
            .param("columns", CHANNEL_COLUMNS)
            .param("id", self.sensor_id);
        let response = self.send(request).await?;
        let rows = response
            .rows("channels")
            .ok_or(SensorError::MissingField("channels"))?;
        let observations = self.decoder.decode_all(rows);
        self.sink.observations(self.sensor_id, &observations);
        Ok(observations)
    }

    pub async fn pause(&self, message: Option<&str>) -> Result<(), SensorError> {
        let mut request = RequestEnvelope::new(PAUSE_URI)
            .param("id", self.sensor_id)
            .param("action", 0);
        if let Some(message) = message.filter(|message| !message.is_empty()) {
            request = request.param("pausemsg", message);
        }
        self.action(request).await
    }

    pub async fn resume(&self) -> Result<(), SensorError> {
        let request = RequestEnvelope::new(PAUSE_URI)
            .param("id", self.sensor_id)
            .param("action", 1);
        self.action(request).await
    }

    /// 确认告警。服务端应答带页面内容即视为成功。
    pub async fn acknowledge_alarm(&self, message: Option<&str>) -> Result<(), SensorError> {
        let mut request = RequestEnvelope::new(ACKNOWLEDGE_URI)
            .param("action", 0)
            .param("id", self.sensor_id);
        if let Some(message) = message.filter(|message| !message.is_empty()) {
            request = request.param("ackmsg", message);
        }
        self.action(request).await
    }

    /// 是否是发给本传感器的变更通知。
    pub fn accepts(&self, envelope: &BroadcastEnvelope) -> bool {
        envelope.target_kind == TargetKind::Sensor && envelope.entity_id == self.sensor_id
    }

    /// 处理变更通知；不属于本传感器的通知返回 false。
    pub async fn handle_notification(&self, envelope: &BroadcastEnvelope) -> bool {
        if !self.accepts(envelope) {
            return false;
        }
        if let Err(err) = self.request_state().await {
            warn!(target: "prtg.sensor", sensor_id = self.sensor_id, error = %err, "notification_refresh_failed");
        }
        true
    }

    async fn action(&self, request: RequestEnvelope) -> Result<(), SensorError> {
        let uri = request.uri.clone();
        let response = self.send(request).await?;
        if response.payload().is_none() {
            warn!(target: "prtg.sensor", sensor_id = self.sensor_id, uri = %uri, "sensor_action_rejected");
            return Err(SensorError::Rejected);
        }
        info!(target: "prtg.sensor", sensor_id = self.sensor_id, uri = %uri, "sensor_action_done");
        self.request_state().await
    }

    async fn send(&self, request: RequestEnvelope) -> Result<ResponseEnvelope, SensorError> {
        let wire = RelayRequest::from_envelope(request)
            .encode()
            .map_err(|err| SensorError::Encode(err.to_string()))?;
        let reply = self.relay.forward(wire).await;
        let response = RelayReply::decode(&reply)
            .map_err(|err| SensorError::InvalidReply(err.to_string()))?
            .into_envelope();
        if !response.is_success() {
            debug!(target: "prtg.sensor", sensor_id = self.sensor_id, code = response.code(), "sensor_request_failed");
            return Err(SensorError::Relay(response.code()));
        }
        Ok(response)
    }
}
