//! 网关运行配置加载。

use domain::{Credentials, ObjectId};
use std::env;
use std::time::Duration;

/// 占位主机串，等同于未配置。
pub const HOST_PLACEHOLDER: &str = "http://";

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 连接相关配置。任意一项变化都应触发重新配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub enabled: bool,
    pub host: String,
    pub credentials: Credentials,
}

impl ConnectionSettings {
    /// 主机为空或仍是占位串。
    pub fn host_is_unset(&self) -> bool {
        let host = self.host.trim();
        host.is_empty() || host == HOST_PLACEHOLDER
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: HOST_PLACEHOLDER.to_string(),
            credentials: Credentials::default(),
        }
    }
}

/// HTTP 超时设置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub total: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_millis(1000),
            total: Duration::from_millis(5000),
        }
    }
}

/// 网关运行配置。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub connection: ConnectionSettings,
    /// 消费者轮询间隔覆盖值（秒），小于 5 表示使用传感器自身间隔。
    pub interval_seconds: u64,
    pub http_addr: String,
    pub webhook_token: Option<String>,
    pub sensor_ids: Vec<ObjectId>,
    pub timeouts: Timeouts,
}

impl GatewayConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let enabled = read_bool_with_default("PRTG_ENABLED", false)?;
        let host = env::var("PRTG_HOST").unwrap_or_else(|_| HOST_PLACEHOLDER.to_string());
        let username = env::var("PRTG_USERNAME").unwrap_or_default();
        let password = env::var("PRTG_PASSWORD").unwrap_or_default();
        let interval_seconds = read_u64_with_default("PRTG_INTERVAL_SECONDS", 0)?;
        let http_addr =
            env::var("PRTG_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let webhook_token = read_optional("PRTG_WEBHOOK_TOKEN");
        let sensor_ids = read_id_list("PRTG_SENSOR_IDS")?;
        let connect_timeout_ms = read_u64_with_default("PRTG_CONNECT_TIMEOUT_MS", 1000)?;
        let request_timeout_ms = read_u64_with_default("PRTG_REQUEST_TIMEOUT_MS", 5000)?;
        if request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "PRTG_REQUEST_TIMEOUT_MS".to_string(),
                "0".to_string(),
            ));
        }

        Ok(Self {
            connection: ConnectionSettings {
                enabled,
                host,
                credentials: Credentials::new(username, password),
            },
            interval_seconds,
            http_addr,
            webhook_token,
            sensor_ids,
            timeouts: Timeouts {
                connect: Duration::from_millis(connect_timeout_ms),
                total: Duration::from_millis(request_timeout_ms),
            },
        })
    }
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(value) => parse_flag(key, &value, default),
        Err(_) => Ok(default),
    }
}

/// 空值取默认值，无法识别的取值报错。
fn parse_flag(key: &str, value: &str, default: bool) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid(key.to_string(), value.to_string())),
    }
}

/// 逗号分隔的对象 ID 列表，空项忽略。
fn read_id_list(key: &str) -> Result<Vec<ObjectId>, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(Vec::new()),
    };
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<ObjectId>()
                .map_err(|_| ConfigError::Invalid(key.to_string(), item.to_string()))
        })
        .collect()
}
