/// 页面型 URI 的后缀，这类响应原样返回。
const PAGE_SUFFIX: &str = ".htm";

/// 按请求 URI 决定的响应形态，每次调用只判定一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// JSON 对象
    Structured,
    /// HTML 页面原文
    OpaquePayload,
}

impl ResponseKind {
    pub fn for_uri(uri: &str) -> Self {
        if uri.ends_with(PAGE_SUFFIX) {
            ResponseKind::OpaquePayload
        } else {
            ResponseKind::Structured
        }
    }
}
