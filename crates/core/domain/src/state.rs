//! 连接状态与会话相关的值类型。

use std::fmt;
use std::net::IpAddr;

/// 网关连接状态机的状态。
///
/// 一次配置过程的终态要么是 `Connected`，要么是三种失败状态之一；
/// 任何重新配置都会从 `Inactive` 重新开始。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// 功能关闭或未配置主机。
    Inactive,
    /// 主机地址无法解析为 URL（空串/缺少主机）。
    UrlInvalid,
    /// DNS 解析失败或服务端路径不存在。
    Disconnected,
    /// 凭据交换被拒绝。
    Unauthorized,
    /// 会话可用。
    Connected,
}

impl ConnectionState {
    /// 对外发布的健康状态码。
    pub fn status_code(self) -> u16 {
        match self {
            ConnectionState::Connected => 102,
            ConnectionState::Inactive => 104,
            ConnectionState::Disconnected => 201,
            ConnectionState::Unauthorized => 202,
            ConnectionState::UrlInvalid => 203,
        }
    }

    pub fn from_status_code(code: u16) -> Option<Self> {
        match code {
            102 => Some(ConnectionState::Connected),
            104 => Some(ConnectionState::Inactive),
            201 => Some(ConnectionState::Disconnected),
            202 => Some(ConnectionState::Unauthorized),
            203 => Some(ConnectionState::UrlInvalid),
            _ => None,
        }
    }

    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Inactive => "inactive",
            ConnectionState::UrlInvalid => "url_invalid",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Unauthorized => "unauthorized",
            ConnectionState::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 对外可见的连接状态快照（状态 + 状态码 + 摘要）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub code: u16,
    /// 规范化后的 base URL；主机未通过校验时为空。
    pub summary: String,
}

impl ConnectionStatus {
    pub fn new(state: ConnectionState, summary: impl Into<String>) -> Self {
        Self {
            state,
            code: state.status_code(),
            summary: summary.into(),
        }
    }

    pub fn inactive() -> Self {
        Self::new(ConnectionState::Inactive, "")
    }
}

/// 校验后的服务端地址。
///
/// `path_prefix` 不以 `/` 结尾；主机在每次校验时解析一次，而不是每次请求解析。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    pub host: String,
    pub resolved_ip: IpAddr,
    pub port: Option<u16>,
    pub path_prefix: String,
}

impl Endpoint {
    /// `scheme://ip[:port]path/`
    pub fn base_url(&self) -> String {
        let address = match self.resolved_ip {
            IpAddr::V4(ip) => ip.to_string(),
            IpAddr::V6(ip) => format!("[{}]", ip),
        };
        match self.port {
            Some(port) => format!(
                "{}://{}:{}{}/",
                self.scheme, address, port, self.path_prefix
            ),
            None => format!("{}://{}{}/", self.scheme, address, self.path_prefix),
        }
    }
}

/// 用户配置的凭据。会话只保留派生出的 hash，不保留明文。
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
