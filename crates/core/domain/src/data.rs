use crate::ObjectId;
use serde_json::{Map, Value};

/// 服务端返回的原始通道记录。
///
/// 字段随通道类型变化，按需逐字段读取，不假定固定结构。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelRecord(Map<String, Value>);

impl ChannelRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// 非对象的行返回 `None`。
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().cloned().map(Self)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn object_id(&self) -> Option<ObjectId> {
        match self.0.get("objid")? {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// 格式化后的名称（随语言变化）。
    pub fn display_name(&self) -> Option<&str> {
        self.text("name")
    }

    /// 原始名称（不随语言变化），存在时优先使用。
    pub fn raw_name(&self) -> Option<&str> {
        self.text("name_raw")
    }

    pub fn name(&self) -> Option<&str> {
        self.raw_name().or_else(|| self.display_name())
    }

    /// 格式化后的值，如 `"12 msec"`。
    pub fn last_value(&self) -> Option<&str> {
        self.text("lastvalue")
    }

    pub fn last_value_raw(&self) -> Option<&Value> {
        self.0.get("lastvalue_raw")
    }

    pub fn unit(&self) -> Option<&str> {
        self.text("unit")
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.as_str()
    }
}

/// 观测值类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationKind {
    Numeric,
    Percentage,
    Counter,
    Duration,
    Rate,
    Boolean,
    String,
}

/// 观测值数据。
#[derive(Debug, Clone, PartialEq)]
pub enum ObservationValue {
    I64(i64),
    F64(f64),
    Bool(bool),
    String(String),
}

impl ObservationValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ObservationValue::I64(v) => Some(*v as f64),
            ObservationValue::F64(v) => Some(*v),
            _ => None,
        }
    }
}

/// 解码后的通道观测值。
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// 导出用标识，负数系统通道已映射到正数空间。
    pub identifier: i64,
    /// 服务端原始对象 ID，用于排序。
    pub source_id: ObjectId,
    pub name: String,
    pub kind: ObservationKind,
    pub unit: String,
    pub scale: f64,
    pub value: ObservationValue,
    pub suggested_profile: Option<&'static str>,
}

/// 传感器状态（服务端 `status_raw`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorStatus {
    Unknown = 1,
    Scanning = 2,
    Up = 3,
    Warning = 4,
    Down = 5,
    NoProbe = 6,
    Paused = 7,
    PausedByDependency = 8,
    PausedBySchedule = 9,
    Unusual = 10,
    NotLicensed = 11,
    PausedUntil = 12,
    DownAcknowledged = 13,
    DownPartial = 14,
}

impl SensorStatus {
    pub fn from_raw(raw: i64) -> Option<Self> {
        let status = match raw {
            1 => SensorStatus::Unknown,
            2 => SensorStatus::Scanning,
            3 => SensorStatus::Up,
            4 => SensorStatus::Warning,
            5 => SensorStatus::Down,
            6 => SensorStatus::NoProbe,
            7 => SensorStatus::Paused,
            8 => SensorStatus::PausedByDependency,
            9 => SensorStatus::PausedBySchedule,
            10 => SensorStatus::Unusual,
            11 => SensorStatus::NotLicensed,
            12 => SensorStatus::PausedUntil,
            13 => SensorStatus::DownAcknowledged,
            14 => SensorStatus::DownPartial,
            _ => return None,
        };
        Some(status)
    }

    pub fn raw(self) -> i64 {
        self as i64
    }

    pub fn label(self) -> &'static str {
        match self {
            SensorStatus::Unknown => "Unknown",
            SensorStatus::Scanning => "Scanning",
            SensorStatus::Up => "Up",
            SensorStatus::Warning => "Warning",
            SensorStatus::Down => "Down",
            SensorStatus::NoProbe => "No Probe",
            SensorStatus::Paused => "Paused",
            SensorStatus::PausedByDependency => "Paused by Dependency",
            SensorStatus::PausedBySchedule => "Paused by Schedule",
            SensorStatus::Unusual => "Unusual",
            SensorStatus::NotLicensed => "Not Licensed",
            SensorStatus::PausedUntil => "Paused Until",
            SensorStatus::DownAcknowledged => "Down Acknowledged",
            SensorStatus::DownPartial => "Down Partial",
        }
    }

    pub fn is_paused(self) -> bool {
        matches!(
            self,
            SensorStatus::Paused
                | SensorStatus::PausedByDependency
                | SensorStatus::PausedBySchedule
                | SensorStatus::PausedUntil
        )
    }
}

/// 单个传感器的概要状态。
#[derive(Debug, Clone, PartialEq)]
pub struct SensorState {
    pub object_id: ObjectId,
    pub name: String,
    pub device: String,
    pub status: SensorStatus,
    /// 服务端格式化后的状态文本。
    pub readable_status: String,
    pub active: bool,
    pub interval_seconds: u64,
}
