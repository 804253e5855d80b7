use crate::SensorError;
use domain::{ObjectId, SensorState, SensorStatus};
use serde_json::Value;

/// 解析 `content=sensors` 表格的一行。
pub fn parse_sensor_row(sensor_id: ObjectId, row: &Value) -> Result<SensorState, SensorError> {
    let name = text(row, "name").unwrap_or_default();
    if name.is_empty() {
        return Err(SensorError::MissingField("name"));
    }
    let status_raw = integer(row, "status_raw").ok_or(SensorError::MissingField("status_raw"))?;
    let status = SensorStatus::from_raw(status_raw).unwrap_or(SensorStatus::Unknown);
    let readable_status = text(row, "status")
        .map(str::to_string)
        .unwrap_or_else(|| status.label().to_string());
    let active = match row.get("active_raw") {
        Some(Value::Bool(flag)) => *flag,
        Some(_) => integer(row, "active_raw").is_some_and(|raw| raw != 0),
        None => text(row, "active").is_some_and(|text| text.eq_ignore_ascii_case("true")),
    };
    let interval_seconds = integer(row, "interval_raw")
        .and_then(|raw| u64::try_from(raw).ok())
        .unwrap_or(0);

    Ok(SensorState {
        object_id: integer(row, "objid").unwrap_or(sensor_id),
        name: name.to_string(),
        device: text(row, "device").unwrap_or_default().to_string(),
        status,
        readable_status,
        active,
        interval_seconds,
    })
}

fn text<'a>(row: &'a Value, key: &str) -> Option<&'a str> {
    row.get(key)?.as_str()
}

fn integer(row: &Value, key: &str) -> Option<i64> {
    match row.get(key)? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value as i64)),
        Value::String(text) => text.trim().parse().ok(),
        Value::Bool(flag) => Some(i64::from(*flag)),
        _ => None,
    }
}
