use relay_contract::PushChannel;

/// 自诊断数据来源（进程/主机指标由宿主提供，这里只负责格式化）。
pub trait DiagnosticsSource: Send + Sync {
    fn channels(&self) -> Vec<PushChannel>;
}

/// 不提供任何通道。
#[derive(Debug, Default)]
pub struct NoopDiagnostics;

impl DiagnosticsSource for NoopDiagnostics {
    fn channels(&self) -> Vec<PushChannel> {
        Vec::new()
    }
}
