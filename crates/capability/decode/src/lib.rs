//! 通道解码：服务端原始通道记录 → 带类别、单位、换算系数与推荐显示配置的观测值。
//!
//! 服务端单位到内部类别的映射只在本模块维护（见 `units`）。
//! 单条记录无法解码时跳过，不影响同批次的其它记录。

mod units;

pub use units::{DisplayProfile, GENERIC, UNIT_TABLE, UnitSpec, find_profile, lookup, profiles};

use domain::{ChannelRecord, Observation, ObservationKind, ObservationValue, ObjectId};
use serde_json::Value;
use tracing::debug;

/// 低于该值的系统通道不导出。
pub const RESERVED_THRESHOLD: ObjectId = -3;
/// 负数系统通道映射到正数空间的偏移量。
pub const SYSTEM_CHANNEL_OFFSET: ObjectId = 255;

/// 通道解码器（无状态）。
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelDecoder;

impl ChannelDecoder {
    pub fn new() -> Self {
        Self
    }

    /// 解码一条记录；无法得到可用类别时返回 None。
    pub fn decode(&self, record: &ChannelRecord) -> Option<Observation> {
        let Some(source_id) = record.object_id() else {
            return skip("missing_objid", None);
        };
        let identifier = map_identifier(source_id)?;
        let name = record.name().unwrap_or_default().to_string();

        let formatted = record.last_value().map(str::trim).unwrap_or_default();
        let (numeric_text, text_unit) = split_formatted(formatted);
        let unit = record
            .unit()
            .map(str::trim)
            .filter(|unit| !unit.is_empty())
            .unwrap_or(text_unit);

        let entry = lookup(unit).unwrap_or(&GENERIC);
        let raw_number = record.last_value_raw().and_then(number_from_raw);
        let text_number = numeric_text.and_then(|text| parse_localized(text, entry.integer));

        if raw_number.is_none() && text_number.is_none() {
            if formatted.is_empty() {
                return skip("no_value", Some(source_id));
            }
            let (kind, value) = match parse_bool(formatted) {
                Some(flag) => (ObservationKind::Boolean, ObservationValue::Bool(flag)),
                None => (
                    ObservationKind::String,
                    ObservationValue::String(formatted.to_string()),
                ),
            };
            return Some(decoded(Observation {
                identifier,
                source_id,
                name,
                kind,
                unit: String::new(),
                scale: 1.0,
                value,
                suggested_profile: None,
            }));
        }

        let (number, scale) = match (raw_number, text_number) {
            (Some(raw), _) => (raw * entry.raw_scale, entry.raw_scale),
            (None, Some(text)) => (text * entry.text_scale, entry.text_scale),
            (None, None) => return skip("no_value", Some(source_id)),
        };
        if !number.is_finite() {
            return skip("not_finite", Some(source_id));
        }
        let value = if entry.integer {
            ObservationValue::I64(number.round() as i64)
        } else {
            ObservationValue::F64(number)
        };

        Some(decoded(Observation {
            identifier,
            source_id,
            name,
            kind: entry.kind,
            unit: unit.to_string(),
            scale,
            value,
            suggested_profile: entry.profile,
        }))
    }

    /// 解码一批表格行；非对象的行与无法解码的通道都被跳过。
    pub fn decode_all(&self, rows: &[Value]) -> Vec<Observation> {
        rows.iter()
            .filter_map(|row| match ChannelRecord::from_value(row) {
                Some(record) => self.decode(&record),
                None => skip("not_an_object", None),
            })
            .collect()
    }
}

/// `< -3` 跳过，`-3..-1` 加偏移，其余原样。
pub fn map_identifier(object_id: ObjectId) -> Option<i64> {
    if object_id < RESERVED_THRESHOLD {
        debug!(target: "prtg.decode", objid = object_id, "channel_reserved");
        prtg_telemetry::record_channel_skipped();
        return None;
    }
    if object_id < 0 {
        Some(object_id + SYSTEM_CHANNEL_OFFSET)
    } else {
        Some(object_id)
    }
}

fn decoded(observation: Observation) -> Observation {
    prtg_telemetry::record_channel_decoded();
    observation
}

fn skip<T>(reason: &'static str, object_id: Option<ObjectId>) -> Option<T> {
    debug!(target: "prtg.decode", reason, objid = ?object_id, "channel_skipped");
    prtg_telemetry::record_channel_skipped();
    None
}

/// 把 `"1.234,5 MByte"` 拆成数值部分与单位部分；没有数值部分时整体视为文本。
fn split_formatted(formatted: &str) -> (Option<&str>, &str) {
    let trimmed = formatted.trim_start_matches(['<', '>']).trim_start();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+')))
        .map(|(index, _)| index)
        .unwrap_or(trimmed.len());
    let number = &trimmed[..end];
    if !number.chars().any(|c| c.is_ascii_digit()) {
        return (None, "");
    }
    (Some(number), trimmed[end..].trim())
}

/// 兼容千分位与逗号小数。
///
/// 只出现一种分隔符且只出现一次、其后恰好三位数字时（如 `1.024`）有歧义：
/// 整数单位按千分位处理，其它单位按小数处理。有 `lastvalue_raw` 时不走这里。
fn parse_localized(text: &str, integer_unit: bool) -> Option<f64> {
    let normalized = match (text.contains('.'), text.contains(',')) {
        (true, true) => {
            // 后出现的分隔符是小数点。
            let dot = text.rfind('.').unwrap_or(0);
            let comma = text.rfind(',').unwrap_or(0);
            if comma > dot {
                text.replace('.', "").replace(',', ".")
            } else {
                text.replace(',', "")
            }
        }
        (false, false) => text.to_string(),
        (dots, _) => {
            let separator = if dots { '.' } else { ',' };
            let tail = text.rsplit(separator).next().unwrap_or_default();
            let grouped = text.matches(separator).count() > 1
                || (integer_unit && tail.len() == 3 && tail.chars().all(|c| c.is_ascii_digit()));
            if grouped {
                text.replace(separator, "")
            } else {
                text.replace(separator, ".")
            }
        }
    };
    normalized.parse().ok()
}

fn number_from_raw(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) if !text.trim().is_empty() => text.trim().parse().ok(),
        _ => None,
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "yes" | "true" | "on" => Some(true),
        "no" | "false" | "off" => Some(false),
        _ => None,
    }
}
