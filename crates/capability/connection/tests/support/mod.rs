#![allow(dead_code)]

use async_trait::async_trait;
use prtg_connection::{HttpReply, HttpRequest, HttpTransport, NameResolver, TransportError};
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 固定返回地址的解析器，记录调用次数。
pub struct StaticResolver {
    addresses: Vec<IpAddr>,
    calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new(addresses: Vec<IpAddr>) -> Self {
        Self {
            addresses,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NameResolver for StaticResolver {
    async fn lookup(&self, _host: &str) -> Vec<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.addresses.clone()
    }
}

/// 按脚本依次应答的传输层，记录所有请求。
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<HttpReply, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(self, status: u16, body: &str) -> Self {
        self.replies
            .lock()
            .expect("replies lock")
            .push_back(Ok(HttpReply::new(status, body)));
        self
    }

    pub fn fail(self, err: TransportError) -> Self {
        self.replies
            .lock()
            .expect("replies lock")
            .push_back(Err(err));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
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
