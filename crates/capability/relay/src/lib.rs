//! 请求中继：所有消费者（内部或经线上封装转发的子消费者）都经由这里调用服务端。
//!
//! 失败不会越过中继边界抛出，一律以带错误码的 `ResponseEnvelope` 返回。

mod entities;
mod error;
mod kind;

pub use entities::decode_entities;
pub use error::{BAD_REQUEST_CODE, MALFORMED_CODE, RelayError, TIMEOUT_CODE};
pub use kind::ResponseKind;

use async_trait::async_trait;
use domain::{RequestEnvelope, ResponseEnvelope};
use prtg_connection::{CallError, GatewayConnection, HttpReply};
use relay_contract::{RelayReply, RelayRequest, TargetKind};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// 父子边界的中继端口：收发的都是序列化后的线上封装。
#[async_trait]
pub trait RelayPort: Send + Sync {
    async fn forward(&self, wire: String) -> String;
}

/// 在唯一连接上执行请求并规范化响应。
#[derive(Clone)]
pub struct RequestRelay {
    connection: Arc<GatewayConnection>,
}

impl RequestRelay {
    pub fn new(connection: Arc<GatewayConnection>) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Arc<GatewayConnection> {
        &self.connection
    }

    /// 执行一次请求，失败时返回只带错误码的响应。
    pub async fn execute(&self, request: RequestEnvelope) -> ResponseEnvelope {
        match self.try_execute(&request).await {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    RelayError::NotConnected(state) => {
                        debug!(target: "prtg.relay", uri = %request.uri, state = %state, "relay_short_circuit");
                    }
                    _ => {
                        warn!(target: "prtg.relay", uri = %request.uri, code = err.code(), error = %err, "relay_failed");
                    }
                }
                ResponseEnvelope::error(err.code())
            }
        }
    }

    /// 执行一次请求，保留具体错误类型。
    pub async fn try_execute(
        &self,
        request: &RequestEnvelope,
    ) -> Result<ResponseEnvelope, RelayError> {
        let kind = ResponseKind::for_uri(&request.uri);
        let reply = self.connection.call(request).await.map_err(|err| match err {
            CallError::NotConnected(state) => RelayError::NotConnected(state),
            CallError::Transport(err) => RelayError::from(err),
        })?;
        if reply.status >= 400 {
            return Err(RelayError::Transport(reply.status));
        }
        classify(kind, reply)
    }

    /// 处理子消费者转发来的线上请求，返回序列化后的响应。
    pub async fn forward_wire(&self, wire: &str) -> String {
        let response = match RelayRequest::decode(wire) {
            Ok(request) if request.target_kind == TargetKind::Gateway => {
                self.execute(request.into_envelope()).await
            }
            Ok(request) => {
                let err = RelayError::BadRequest(format!(
                    "unexpected target kind {:?}",
                    request.target_kind
                ));
                warn!(target: "prtg.relay", error = %err, "relay_bad_request");
                ResponseEnvelope::error(err.code())
            }
            Err(decode_err) => {
                let err = RelayError::BadRequest(decode_err.to_string());
                warn!(target: "prtg.relay", error = %err, "relay_bad_request");
                ResponseEnvelope::error(err.code())
            }
        };
        encode_reply(&response)
    }
}

#[async_trait]
impl RelayPort for RequestRelay {
    async fn forward(&self, wire: String) -> String {
        self.forward_wire(&wire).await
    }
}

fn classify(kind: ResponseKind, reply: HttpReply) -> Result<ResponseEnvelope, RelayError> {
    match kind {
        ResponseKind::OpaquePayload => Ok(ResponseEnvelope::Payload {
            code: reply.status,
            payload: reply.text(),
        }),
        ResponseKind::Structured => match serde_json::from_slice::<Value>(&reply.body) {
            Ok(Value::Object(mut fields)) => {
                for value in fields.values_mut() {
                    decode_entities(value);
                }
                Ok(ResponseEnvelope::Structured { fields })
            }
            Ok(_) | Err(_) => {
                prtg_telemetry::record_malformed_response();
                Err(RelayError::MalformedResponse)
            }
        },
    }
}

/// 序列化响应；理论上不会失败，失败时退化为只带错误码的 JSON。
fn encode_reply(response: &ResponseEnvelope) -> String {
    let reply = RelayReply::from_envelope(response);
    match reply.encode() {
        Ok(wire) => wire,
        Err(err) => {
            warn!(target: "prtg.relay", error = %err, "relay_reply_encode_failed");
            format!("{{\"code\":{}}}", response.code())
        }
    }
}
