//! 主机地址校验与解析。

use crate::error::ResolveError;
use async_trait::async_trait;
use domain::Endpoint;
use prtg_config::HOST_PLACEHOLDER;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// 缺少 scheme 时使用的默认值。
pub const DEFAULT_SCHEME: &str = "http";

/// 名称解析抽象。
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// 返回主机的全部地址；解析失败时返回空列表。
    async fn lookup(&self, host: &str) -> Vec<IpAddr>;
}

/// 基于 tokio 的系统解析器。
#[derive(Debug, Clone, Default)]
pub struct SystemResolver;

#[async_trait]
impl NameResolver for SystemResolver {
    async fn lookup(&self, host: &str) -> Vec<IpAddr> {
        match tokio::net::lookup_host((host, 0)).await {
            Ok(addrs) => addrs.map(|addr| addr.ip()).collect(),
            Err(err) => {
                debug!(target: "prtg.connection", host, error = %err, "dns_lookup_failed");
                Vec::new()
            }
        }
    }
}

/// 把用户输入的地址校验并规范化为 `Endpoint`。
///
/// 每次校验只解析一次主机；不做重试，何时重新校验由调用方决定。
#[derive(Clone)]
pub struct HostResolver {
    names: Arc<dyn NameResolver>,
}

impl HostResolver {
    pub fn new(names: Arc<dyn NameResolver>) -> Self {
        Self { names }
    }

    pub fn system() -> Self {
        Self::new(Arc::new(SystemResolver))
    }

    pub async fn resolve(&self, raw: &str) -> Result<Endpoint, ResolveError> {
        let raw = raw.trim();
        if raw.is_empty() || raw == HOST_PLACEHOLDER {
            return Err(ResolveError::UrlInvalid(raw.to_string()));
        }

        let with_scheme = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("{}://{}", DEFAULT_SCHEME, raw)
        };
        // url 会把 "http:///x" 这类输入的路径段当成主机，这里先挡掉。
        let authority = with_scheme
            .split_once("://")
            .map(|(_, rest)| rest.split(['/', '?', '#']).next().unwrap_or(""))
            .unwrap_or("");
        if authority.is_empty() {
            return Err(ResolveError::UrlInvalid(raw.to_string()));
        }

        let parsed = url::Url::parse(&with_scheme)
            .map_err(|_| ResolveError::UrlInvalid(raw.to_string()))?;
        let scheme = parsed.scheme().to_string();
        if scheme != "http" && scheme != "https" {
            return Err(ResolveError::UrlInvalid(raw.to_string()));
        }
        let host = match parsed.host() {
            Some(url::Host::Domain(domain)) => domain.to_string(),
            Some(url::Host::Ipv4(ip)) => ip.to_string(),
            Some(url::Host::Ipv6(ip)) => ip.to_string(),
            None => return Err(ResolveError::UrlInvalid(raw.to_string())),
        };

        let resolved_ip = match parsed.host() {
            Some(url::Host::Ipv4(ip)) => IpAddr::V4(ip),
            Some(url::Host::Ipv6(ip)) => IpAddr::V6(ip),
            _ => {
                let addresses = self.names.lookup(&host).await;
                match pick_address(&addresses) {
                    Some(ip) => ip,
                    None => {
                        warn!(target: "prtg.connection", host = %host, "host_unresolvable");
                        return Err(ResolveError::HostUnresolvable(host));
                    }
                }
            }
        };

        let path = parsed.path();
        let path_prefix = path.strip_suffix('/').unwrap_or(path).to_string();

        Ok(Endpoint {
            scheme,
            host,
            resolved_ip,
            port: parsed.port(),
            path_prefix,
        })
    }
}

/// 优先 IPv4。
fn pick_address(addresses: &[IpAddr]) -> Option<IpAddr> {
    addresses
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addresses.first())
        .copied()
}
