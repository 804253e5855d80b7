//! # PRTG 连接能力模块
//!
//! 维护与 PRTG 服务端之间唯一的一条已鉴权会话，所有出站 HTTP 调用都经由这里发出。
//!
//! ## 架构设计
//!
//! ```text
//! ConnectionSettings (enabled + host + credentials)
//!       │  reconfigure()
//!       ▼
//! GatewayConnection ── 状态: Inactive / UrlInvalid / Disconnected / Unauthorized / Connected
//!       │
//!       ├── HostResolver  (URL 校验 + 一次性 DNS 解析 → Endpoint)
//!       ├── AuthSession   (api/getpasshash.htm → passhash)
//!       └── HttpTransport (reqwest，连接超时 + 总超时)
//!       │
//!       ▼
//! call(RequestEnvelope) / fetch_graph(GraphRequest)
//! ```
//!
//! 状态只在 `reconfigure` 中变化；失败状态保持到下一次重新配置，不自动重试。

mod auth;
mod connection;
mod error;
mod graph;
mod resolver;
mod transport;

pub use auth::{AuthSession, PASSHASH_URI};
pub use connection::GatewayConnection;
pub use error::{AuthError, CallError, GraphError, ResolveError, TransportError};
pub use graph::{Graph, GraphFormat, GraphRange, GraphRequest};
pub use resolver::{DEFAULT_SCHEME, HostResolver, NameResolver, SystemResolver};
pub use transport::{HttpReply, HttpRequest, HttpTransport, ReqwestTransport, redact_url};

use std::collections::BTreeMap;

/// 拼接 `base + uri + ?query`，查询串按表单编码。
pub fn build_query_url(base_url: &str, uri: &str, params: &BTreeMap<String, String>) -> String {
    let uri = uri.trim_start_matches('/');
    if params.is_empty() {
        return format!("{}{}", base_url, uri);
    }
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish();
    format!("{}{}?{}", base_url, uri, query)
}
