//! 会话 hash 获取。

use crate::error::AuthError;
use crate::transport::{HttpRequest, HttpTransport};
use crate::build_query_url;
use domain::{Credentials, Endpoint};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// 用户名/密码换取 passhash 的接口。
pub const PASSHASH_URI: &str = "api/getpasshash.htm";

/// 用凭据换取会话 hash。失败不重试。
#[derive(Clone)]
pub struct AuthSession {
    transport: Arc<dyn HttpTransport>,
}

impl AuthSession {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    pub async fn authenticate(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<String, AuthError> {
        let mut params = BTreeMap::new();
        params.insert("username".to_string(), credentials.username.clone());
        params.insert("password".to_string(), credentials.password.clone());
        let url = build_query_url(&endpoint.base_url(), PASSHASH_URI, &params);

        let reply = match self.transport.send(HttpRequest::get(url)).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(target: "prtg.connection", error = %err, "passhash_request_failed");
                return Err(AuthError::Unauthorized);
            }
        };

        // 4xx/5xx 的响应体是错误页，按空响应处理。
        let hash = if reply.status >= 400 {
            String::new()
        } else {
            reply.text().trim().to_string()
        };
        if !hash.is_empty() {
            info!(target: "prtg.connection", username = %credentials.username, "passhash_obtained");
            return Ok(hash);
        }
        if reply.status == 404 {
            warn!(target: "prtg.connection", status = reply.status, "passhash_endpoint_not_found");
            Err(AuthError::HostUnresolvable)
        } else {
            warn!(target: "prtg.connection", status = reply.status, "passhash_rejected");
            Err(AuthError::Unauthorized)
        }
    }
}
