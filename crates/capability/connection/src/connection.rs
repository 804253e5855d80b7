//! 网关连接状态机。

use crate::auth::AuthSession;
use crate::build_query_url;
use crate::error::{AuthError, CallError, GraphError, ResolveError};
use crate::graph::{Graph, GraphRequest};
use crate::resolver::HostResolver;
use crate::transport::{HttpReply, HttpRequest, HttpTransport, redact_url};
use domain::{ConnectionState, ConnectionStatus, Endpoint, RequestEnvelope};
use prtg_config::ConnectionSettings;
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

/// 当前会话。只由 `reconfigure` 修改。
#[derive(Debug, Clone)]
struct Session {
    endpoint: Option<Endpoint>,
    username: String,
    hash: String,
    status: ConnectionStatus,
}

impl Session {
    fn cleared() -> Self {
        Self {
            endpoint: None,
            username: String::new(),
            hash: String::new(),
            status: ConnectionStatus::inactive(),
        }
    }
}

/// 与 PRTG 服务端之间的唯一连接，所有出站 HTTP 调用的所有者。
///
/// 出站调用与重新配置共用一把异步锁，因此同一实例上不会有并发的请求；
/// 读状态不需要拿这把锁。
pub struct GatewayConnection {
    transport: Arc<dyn HttpTransport>,
    resolver: HostResolver,
    auth: AuthSession,
    session: RwLock<Session>,
    status_tx: watch::Sender<ConnectionStatus>,
    call_lock: Mutex<()>,
}

impl GatewayConnection {
    pub fn new(transport: Arc<dyn HttpTransport>, resolver: HostResolver) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::inactive());
        Self {
            auth: AuthSession::new(transport.clone()),
            transport,
            resolver,
            session: RwLock::new(Session::cleared()),
            status_tx,
            call_lock: Mutex::new(()),
        }
    }

    /// 使用系统 DNS 解析器。
    pub fn with_system_resolver(transport: Arc<dyn HttpTransport>) -> Self {
        Self::new(transport, HostResolver::system())
    }

    pub fn state(&self) -> ConnectionState {
        self.read_session(|session| session.status.state)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.read_session(|session| session.status.clone())
    }

    /// 订阅状态变化（每次重新配置的终态）。
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// 按新配置重建会话：清空 hash → 校验地址 → 鉴权。
    ///
    /// 失败状态保持到下一次调用，这里不做重试。
    pub async fn reconfigure(&self, settings: &ConnectionSettings) -> ConnectionState {
        let _guard = self.call_lock.lock().await;
        prtg_telemetry::record_reconfiguration();
        self.write_session(Session::cleared());

        if !settings.enabled || settings.host_is_unset() {
            return self.finish(Session::cleared());
        }

        let endpoint = match self.resolver.resolve(&settings.host).await {
            Ok(endpoint) => endpoint,
            Err(ResolveError::UrlInvalid(raw)) => {
                warn!(target: "prtg.connection", host = %raw, "host_url_invalid");
                return self.finish(Session {
                    status: ConnectionStatus::new(ConnectionState::UrlInvalid, ""),
                    ..Session::cleared()
                });
            }
            Err(ResolveError::HostUnresolvable(_)) => {
                return self.finish(Session {
                    status: ConnectionStatus::new(ConnectionState::Disconnected, ""),
                    ..Session::cleared()
                });
            }
        };
        let summary = endpoint.base_url();

        let (state, hash) = match self
            .auth
            .authenticate(&endpoint, &settings.credentials)
            .await
        {
            Ok(hash) => (ConnectionState::Connected, hash),
            Err(AuthError::HostUnresolvable) => (ConnectionState::Disconnected, String::new()),
            Err(AuthError::Unauthorized) => (ConnectionState::Unauthorized, String::new()),
        };

        self.finish(Session {
            endpoint: Some(endpoint),
            username: settings.credentials.username.clone(),
            hash,
            status: ConnectionStatus::new(state, summary),
        })
    }

    /// 合并鉴权参数后的完整 URL；未连接时返回 None。
    pub fn query_url(&self, request: &RequestEnvelope) -> Option<String> {
        self.read_session(|session| {
            let endpoint = session.endpoint.as_ref()?;
            let mut params = request.query_params.clone();
            if !session.hash.is_empty() {
                params.insert("username".to_string(), session.username.clone());
                params.insert("passhash".to_string(), session.hash.clone());
            }
            Some(build_query_url(
                &endpoint.base_url(),
                &request.uri,
                &params,
            ))
        })
    }

    /// 通过当前会话发出一次请求。
    ///
    /// 状态不是 Connected 时直接失败，不发出任何 HTTP 请求。
    pub async fn call(&self, request: &RequestEnvelope) -> Result<HttpReply, CallError> {
        let state = self.state();
        if !state.is_connected() {
            prtg_telemetry::record_request_short_circuited();
            debug!(target: "prtg.connection", uri = %request.uri, state = %state, "call_short_circuit");
            return Err(CallError::NotConnected(state));
        }

        let _guard = self.call_lock.lock().await;
        // 等锁期间可能发生了重新配置。
        let state = self.state();
        if !state.is_connected() {
            prtg_telemetry::record_request_short_circuited();
            return Err(CallError::NotConnected(state));
        }
        let Some(url) = self.query_url(request) else {
            prtg_telemetry::record_request_short_circuited();
            return Err(CallError::NotConnected(state));
        };

        prtg_telemetry::record_request_issued();
        let body = request.is_post().then(|| request.post_body.clone());
        match self.transport.send(HttpRequest { url: url.clone(), body }).await {
            Ok(reply) => {
                if reply.status >= 400 {
                    prtg_telemetry::record_request_failed();
                    warn!(target: "prtg.connection", url = %redact_url(&url), status = reply.status, "call_http_error");
                }
                Ok(reply)
            }
            Err(err) => {
                prtg_telemetry::record_request_failed();
                warn!(target: "prtg.connection", url = %redact_url(&url), error = %err, "call_transport_failed");
                Err(CallError::Transport(err))
            }
        }
    }

    /// 获取传感器图表。
    pub async fn fetch_graph(&self, request: &GraphRequest) -> Result<Graph, GraphError> {
        let reply = self.call(&request.to_envelope()).await?;
        if reply.status >= 400 {
            return Err(GraphError::Http(reply.status));
        }
        if reply.body.is_empty() {
            return Err(GraphError::Empty);
        }
        Ok(Graph {
            content_type: request.format.content_type(),
            bytes: reply.body,
        })
    }

    fn finish(&self, session: Session) -> ConnectionState {
        let status = session.status.clone();
        self.write_session(session);
        info!(
            target: "prtg.connection",
            state = %status.state,
            code = status.code,
            summary = %status.summary,
            "connection_state_changed"
        );
        self.status_tx.send_replace(status.clone());
        status.state
    }

    fn read_session<T>(&self, read: impl FnOnce(&Session) -> T) -> T {
        match self.session.read() {
            Ok(session) => read(&session),
            Err(poisoned) => read(&poisoned.into_inner()),
        }
    }

    fn write_session(&self, session: Session) {
        match self.session.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }
}
