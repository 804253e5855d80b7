use domain::ConnectionState;
use prtg_connection::TransportError;

/// 超时对应的响应码。
pub const TIMEOUT_CODE: u16 = 408;
/// 响应体无法解析对应的响应码。
pub const MALFORMED_CODE: u16 = 405;
/// 线上请求无法解码对应的响应码。
pub const BAD_REQUEST_CODE: u16 = 400;

/// 中继错误。只在中继内部使用，对外体现为响应码。
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("not connected: {0}")]
    NotConnected(ConnectionState),

    #[error("transport timeout")]
    TransportTimeout,

    /// 0 表示没有拿到 HTTP 响应
    #[error("transport error: status {0}")]
    Transport(u16),

    #[error("malformed response")]
    MalformedResponse,

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl RelayError {
    pub fn code(&self) -> u16 {
        match self {
            RelayError::NotConnected(state) => state.status_code(),
            RelayError::TransportTimeout => TIMEOUT_CODE,
            RelayError::Transport(status) => *status,
            RelayError::MalformedResponse => MALFORMED_CODE,
            RelayError::BadRequest(_) => BAD_REQUEST_CODE,
        }
    }
}

impl From<TransportError> for RelayError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => RelayError::TransportTimeout,
            TransportError::Failed(_) | TransportError::Build(_) => RelayError::Transport(0),
        }
    }
}
