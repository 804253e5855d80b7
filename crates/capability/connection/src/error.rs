//! 连接错误类型定义

use domain::ConnectionState;

/// 地址校验错误
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// 空串、占位串或缺少主机
    #[error("url invalid: {0}")]
    UrlInvalid(String),

    /// DNS 没有返回任何地址
    #[error("host unresolvable: {0}")]
    HostUnresolvable(String),
}

/// 会话鉴权错误
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// 凭据被拒绝（含其它空响应）
    #[error("unauthorized")]
    Unauthorized,

    /// 鉴权接口 404：服务端路径本身不对
    #[error("host unresolvable: passhash endpoint not found")]
    HostUnresolvable,
}

/// 传输层错误
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// 超过连接超时或总超时
    #[error("timeout")]
    Timeout,

    /// 连接失败等未拿到 HTTP 响应的情况
    #[error("transport failed: {0}")]
    Failed(String),

    /// HTTP 客户端构建失败
    #[error("client build failed: {0}")]
    Build(String),
}

/// 经由连接发出的调用错误
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// 当前状态不是 Connected，未发出请求
    #[error("not connected: {0}")]
    NotConnected(ConnectionState),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// 图表获取错误
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("not connected: {0}")]
    NotConnected(ConnectionState),

    #[error(transparent)]
    Transport(TransportError),

    #[error("http status {0}")]
    Http(u16),

    #[error("empty graph")]
    Empty,
}

impl From<CallError> for GraphError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::NotConnected(state) => GraphError::NotConnected(state),
            CallError::Transport(err) => GraphError::Transport(err),
        }
    }
}
