//! 网关与子消费者之间稳定的线上封装格式。

use domain::{ObjectId, RequestEnvelope, ResponseEnvelope, SUCCESS_CODE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 封装的目标类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// 子消费者 → 网关的请求。
    Gateway,
    /// 网关 → 传感器消费者的变更通知。
    Sensor,
}

/// 子消费者发给网关的请求封装。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    pub target_kind: TargetKind,
    pub uri: String,
    #[serde(default)]
    pub query_params: BTreeMap<String, String>,
    #[serde(default)]
    pub post_body: String,
}

impl RelayRequest {
    pub fn from_envelope(envelope: RequestEnvelope) -> Self {
        Self {
            target_kind: TargetKind::Gateway,
            uri: envelope.uri,
            query_params: envelope.query_params,
            post_body: envelope.post_body,
        }
    }

    pub fn into_envelope(self) -> RequestEnvelope {
        RequestEnvelope {
            uri: self.uri,
            query_params: self.query_params,
            post_body: self.post_body,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(wire: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(wire)
    }
}

/// 网关回给子消费者的响应封装。
///
/// `fields` 与 `payload` 至多一个存在；都不存在表示失败，仅 `code` 有意义。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayReply {
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl RelayReply {
    pub fn from_envelope(envelope: &ResponseEnvelope) -> Self {
        match envelope {
            ResponseEnvelope::Structured { fields } => Self {
                code: SUCCESS_CODE,
                fields: Some(fields.clone()),
                payload: None,
            },
            ResponseEnvelope::Payload { code, payload } => Self {
                code: *code,
                fields: None,
                payload: Some(payload.clone()),
            },
            ResponseEnvelope::Error { code } => Self {
                code: *code,
                fields: None,
                payload: None,
            },
        }
    }

    /// 两者同时存在视为违反约定，按失败处理。
    pub fn into_envelope(self) -> ResponseEnvelope {
        match (self.fields, self.payload) {
            (Some(fields), None) => ResponseEnvelope::Structured { fields },
            (None, Some(payload)) => ResponseEnvelope::Payload {
                code: self.code,
                payload,
            },
            _ => ResponseEnvelope::Error { code: self.code },
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(wire: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(wire)
    }
}

/// 网关推送给子消费者的变更通知。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastEnvelope {
    pub entity_id: ObjectId,
    pub target_kind: TargetKind,
}

impl BroadcastEnvelope {
    pub fn sensor(entity_id: ObjectId) -> Self {
        Self {
            entity_id,
            target_kind: TargetKind::Sensor,
        }
    }
}

/// 推送型传感器期望的自诊断报告结构。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushReport {
    pub prtg: PushResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushResult {
    pub error: u8,
    pub result: Vec<PushChannel>,
}

impl PushReport {
    pub fn new(channels: Vec<PushChannel>) -> Self {
        Self {
            prtg: PushResult {
                error: 0,
                result: channels,
            },
        }
    }
}

/// 单个推送通道。可选字段缺省时不输出。
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PushChannel {
    pub channel: String,
    pub value: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customunit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub float: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speedtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limitmaxwarning: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limitmaxerror: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limitminwarning: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limitminerror: Option<f64>,
    #[serde(rename = "LimitMode", skip_serializing_if = "Option::is_none")]
    pub limit_mode: Option<u8>,
}

impl PushChannel {
    pub fn new(channel: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            value,
            unit: unit.into(),
            ..Self::default()
        }
    }

    /// 上限告警阈值，同时打开 LimitMode。
    pub fn max_limits(mut self, warning: f64, error: f64) -> Self {
        self.limitmaxwarning = Some(warning);
        self.limitmaxerror = Some(error);
        self.limit_mode = Some(1);
        self
    }

    /// 下限告警阈值，同时打开 LimitMode。
    pub fn min_limits(mut self, warning: f64, error: f64) -> Self {
        self.limitminwarning = Some(warning);
        self.limitminerror = Some(error);
        self.limit_mode = Some(1);
        self
    }

    pub fn with_float(mut self) -> Self {
        self.float = Some(1);
        self
    }

    pub fn custom_unit(mut self, unit: impl Into<String>, speedtime: Option<&str>) -> Self {
        self.unit = "Custom".to_string();
        self.customunit = Some(unit.into());
        self.speedtime = speedtime.map(str::to_string);
        self
    }
}
