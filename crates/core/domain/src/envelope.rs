//! 中继请求/响应封装。

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 成功响应的哨兵状态码。
pub const SUCCESS_CODE: u16 = 200;

/// 一次 API 调用的请求描述。
///
/// `query_params` 的键区分大小写；带会话 hash 时鉴权步骤会覆盖
/// `username` 与 `passhash`。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestEnvelope {
    pub uri: String,
    pub query_params: BTreeMap<String, String>,
    /// 为空时发 GET，否则发 POST。
    pub post_body: String,
}

impl RequestEnvelope {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            query_params: BTreeMap::new(),
            post_body: String::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query_params.insert(key.into(), value.to_string());
        self
    }

    pub fn post(mut self, body: impl Into<String>) -> Self {
        self.post_body = body.into();
        self
    }

    pub fn is_post(&self) -> bool {
        !self.post_body.is_empty()
    }
}

/// 中继响应。
///
/// 成功时 `Structured` 与 `Payload` 二选一；失败时只有状态码有意义。
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    /// 已解析的 JSON 对象（字符串已做 HTML 实体解码）。
    Structured { fields: Map<String, Value> },
    /// `.htm` 页面的原始内容与 HTTP 状态码。
    Payload { code: u16, payload: String },
    Error { code: u16 },
}

impl ResponseEnvelope {
    pub fn error(code: u16) -> Self {
        ResponseEnvelope::Error { code }
    }

    pub fn code(&self) -> u16 {
        match self {
            ResponseEnvelope::Structured { .. } => SUCCESS_CODE,
            ResponseEnvelope::Payload { code, .. } => *code,
            ResponseEnvelope::Error { code } => *code,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, ResponseEnvelope::Error { .. })
    }

    pub fn fields(&self) -> Option<&Map<String, Value>> {
        match self {
            ResponseEnvelope::Structured { fields } => Some(fields),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&str> {
        match self {
            ResponseEnvelope::Payload { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// 取出结构化结果中的某个数组字段（如 `sensors`/`channels`）。
    pub fn rows(&self, key: &str) -> Option<&Vec<Value>> {
        self.fields()?.get(key)?.as_array()
    }
}
