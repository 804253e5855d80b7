#![allow(dead_code)]

use async_trait::async_trait;
use domain::Credentials;
use prtg_config::ConnectionSettings;
use prtg_connection::{
    GatewayConnection, HostResolver, HttpReply, HttpRequest, HttpTransport, TransportError,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// 按脚本应答并记录请求的传输层。
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<HttpReply, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn push(&self, reply: Result<HttpReply, TransportError>) {
        self.replies.lock().expect("replies lock").push_back(reply);
    }

    pub fn reply(&self, status: u16, body: &str) {
        self.push(Ok(HttpReply::new(status, body)));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    pub fn last_url(&self) -> Option<String> {
        self.requests
            .lock()
            .expect("requests lock")
            .last()
            .map(|request| request.url.clone())
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpReply, TransportError> {
        self.requests.lock().expect("requests lock").push(request);
        self.replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Failed("no scripted reply".to_string())))
    }
}

/// IP 字面量主机不走 DNS，系统解析器即可。
pub async fn connected(transport: Arc<ScriptedTransport>) -> Arc<GatewayConnection> {
    transport.reply(200, "hash42");
    let connection = Arc::new(GatewayConnection::new(
        transport,
        HostResolver::system(),
    ));
    connection
        .reconfigure(&ConnectionSettings {
            enabled: true,
            host: "http://10.1.1.1".to_string(),
            credentials: Credentials::new("admin", "secret"),
        })
        .await;
    connection
}

pub fn inactive(transport: Arc<ScriptedTransport>) -> Arc<GatewayConnection> {
    Arc::new(GatewayConnection::new(transport, HostResolver::system()))
}
