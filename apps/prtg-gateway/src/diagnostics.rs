//! 自诊断通道：进程内计数器 + 主机/进程资源。

use prtg_telemetry::{MetricsSnapshot, metrics};
use prtg_webhook::DiagnosticsSource;
use relay_contract::PushChannel;
use std::sync::Mutex;
use sysinfo::{Disks, System};

/// 空闲比例低于 20% 告警，低于 5% 报错。
const FREE_WARNING: f64 = 20.0;
const FREE_ERROR: f64 = 5.0;
/// CPU 负载高于 70% 告警，高于 90% 报错。
const CPU_WARNING: f64 = 70.0;
const CPU_ERROR: f64 = 90.0;

/// 磁盘使用情况。
#[derive(Debug, Clone, PartialEq)]
pub struct DiskUsage {
    pub name: String,
    pub free_bytes: u64,
    pub total_bytes: u64,
}

/// 本进程的资源占用。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessUsage {
    /// 只有部分平台能取到线程数。
    pub threads: Option<usize>,
    pub virtual_bytes: u64,
    pub resident_bytes: u64,
}

/// 一次主机采样。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostSnapshot {
    pub physical_free: u64,
    pub physical_total: u64,
    pub swap_free: u64,
    pub swap_total: u64,
    /// 每个逻辑 CPU 的负载（%）。
    pub cpu_loads: Vec<f64>,
    pub disks: Vec<DiskUsage>,
    pub process: Option<ProcessUsage>,
    pub process_count: usize,
}

/// 把计数器快照与主机采样整理成推送型传感器的通道列表。
///
/// `System` 跨请求保留：CPU 负载需要两次刷新之间的差值。
pub struct TelemetryDiagnostics {
    system: Mutex<System>,
}

impl TelemetryDiagnostics {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new_all()),
        }
    }

    fn sample_host(&self) -> HostSnapshot {
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        system.refresh_all();

        let process = sysinfo::get_current_pid()
            .ok()
            .and_then(|pid| system.process(pid))
            .map(|process| ProcessUsage {
                threads: process.tasks().map(|tasks| tasks.len()),
                virtual_bytes: process.virtual_memory(),
                resident_bytes: process.memory(),
            });
        let disks = Disks::new_with_refreshed_list()
            .list()
            .iter()
            .map(|disk| DiskUsage {
                name: disk.mount_point().display().to_string(),
                free_bytes: disk.available_space(),
                total_bytes: disk.total_space(),
            })
            .collect();

        HostSnapshot {
            physical_free: system.available_memory(),
            physical_total: system.total_memory(),
            swap_free: system.free_swap(),
            swap_total: system.total_swap(),
            cpu_loads: system
                .cpus()
                .iter()
                .map(|cpu| f64::from(cpu.cpu_usage()))
                .collect(),
            disks,
            process,
            process_count: system.processes().len(),
        }
    }
}

impl Default for TelemetryDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsSource for TelemetryDiagnostics {
    fn channels(&self) -> Vec<PushChannel> {
        let mut channels = channels_from(&metrics().snapshot());
        channels.extend(host_channels(&self.sample_host()));
        channels
    }
}

/// 计数器通道；速率类按运行分钟数折算。
pub fn channels_from(snapshot: &MetricsSnapshot) -> Vec<PushChannel> {
    let minutes = (snapshot.uptime_seconds as f64 / 60.0).max(1.0);
    let per_minute = |count: u64| (count as f64 / minutes).round();

    vec![
        PushChannel::new("Uptime", snapshot.uptime_seconds as f64, "TimeSeconds"),
        PushChannel::new("Requests Issued", snapshot.requests_issued as f64, "Count"),
        PushChannel::new(
            "Requests Short Circuited",
            snapshot.requests_short_circuited as f64,
            "Count",
        ),
        PushChannel::new("Requests Failed", per_minute(snapshot.requests_failed), "Count")
            .custom_unit("#/Min.", Some("Minute"))
            .max_limits(5.0, 10.0),
        PushChannel::new(
            "Malformed Responses",
            snapshot.malformed_responses as f64,
            "Count",
        )
        .max_limits(1.0, 10.0),
        PushChannel::new("Webhook Events", per_minute(snapshot.webhook_events), "Count")
            .custom_unit("#/Min.", Some("Minute")),
        PushChannel::new("Broadcasts Sent", snapshot.broadcasts_sent as f64, "Count"),
        PushChannel::new(
            "Broadcasts Dropped",
            snapshot.broadcasts_dropped as f64,
            "Count",
        )
        .max_limits(1.0, 10.0),
        PushChannel::new("Channels Decoded", snapshot.channels_decoded as f64, "Count"),
        PushChannel::new("Channels Skipped", snapshot.channels_skipped as f64, "Count"),
        PushChannel::new("Reconfigurations", snapshot.reconfigurations as f64, "Count"),
    ]
}

/// 主机与进程通道。总量为 0 的比例通道不输出。
pub fn host_channels(host: &HostSnapshot) -> Vec<PushChannel> {
    let mut channels = Vec::new();

    if let Some(process) = &host.process {
        if let Some(threads) = process.threads {
            channels.push(PushChannel::new("Process Threads", threads as f64, "Count"));
        }
        channels.push(PushChannel::new(
            "Process Virtualsize",
            process.virtual_bytes as f64,
            "BytesMemory",
        ));
        channels.push(PushChannel::new(
            "Process Workingsetsize",
            process.resident_bytes as f64,
            "BytesMemory",
        ));
    }
    channels.push(PushChannel::new(
        "Process Count",
        host.process_count as f64,
        "Count",
    ));

    let memory = [
        ("System RAM Physical Free", host.physical_free, host.physical_total),
        ("System RAM Pagefile Free", host.swap_free, host.swap_total),
    ];
    for (name, free, total) in memory {
        if let Some(percent) = free_percent(free, total) {
            channels.push(free_channel(name, percent));
        }
    }

    for (index, load) in host.cpu_loads.iter().enumerate() {
        channels.push(
            PushChannel::new(format!("System CPU {}", index), *load, "CPU")
                .with_float()
                .max_limits(CPU_WARNING, CPU_ERROR),
        );
    }

    for disk in &host.disks {
        let Some(percent) = free_percent(disk.free_bytes, disk.total_bytes) else {
            continue;
        };
        channels.push(free_channel(format!("Disk {}", disk.name), percent));
        channels.push(PushChannel::new(
            format!("Disk {} Free", disk.name),
            disk.free_bytes as f64,
            "BytesDisk",
        ));
    }

    channels
}

fn free_percent(free: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| free as f64 / total as f64 * 100.0)
}

fn free_channel(name: impl Into<String>, percent: f64) -> PushChannel {
    PushChannel::new(name, percent, "Percent")
        .with_float()
        .min_limits(FREE_WARNING, FREE_ERROR)
}
