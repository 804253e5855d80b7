pub mod data;
pub mod envelope;
pub mod state;

pub use data::{
    ChannelRecord, Observation, ObservationKind, ObservationValue, SensorState, SensorStatus,
};
pub use envelope::{RequestEnvelope, ResponseEnvelope, SUCCESS_CODE};
pub use state::{ConnectionState, ConnectionStatus, Credentials, Endpoint};

/// PRTG 对象 ID（传感器、设备、通道共用同一数值空间）。
pub type ObjectId = i64;
