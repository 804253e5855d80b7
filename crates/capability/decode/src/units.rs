//! 服务端单位 → (类别, 换算系数, 显示配置) 对照表。

use domain::ObservationKind;

/// 一种服务端单位的解码规则。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitSpec {
    /// 服务端单位串（比较时忽略大小写）。
    pub unit: &'static str,
    pub kind: ObservationKind,
    pub profile: Option<&'static str>,
    /// `lastvalue_raw`（服务端基本单位）到显示单位的系数。
    pub raw_scale: f64,
    /// 格式化文本中的数值到显示单位的系数。
    pub text_scale: f64,
    /// 显示配置为整数时按整数输出。
    pub integer: bool,
}

const MIB: f64 = 1024.0 * 1024.0;

const fn entry(
    unit: &'static str,
    kind: ObservationKind,
    profile: &'static str,
    raw_scale: f64,
    text_scale: f64,
    integer: bool,
) -> UnitSpec {
    UnitSpec {
        unit,
        kind,
        profile: Some(profile),
        raw_scale,
        text_scale,
        integer,
    }
}

pub const UNIT_TABLE: &[UnitSpec] = &[
    entry("%", ObservationKind::Percentage, "PRTG.Intensity", 1.0, 1.0, false),
    entry("msec", ObservationKind::Duration, "PRTG.ms", 1.0, 1.0, false),
    entry("ms", ObservationKind::Duration, "PRTG.ms", 1.0, 1.0, false),
    entry("sec", ObservationKind::Duration, "PRTG.Sec", 1.0, 1.0, true),
    entry("s", ObservationKind::Duration, "PRTG.Sec", 1.0, 1.0, true),
    entry("#", ObservationKind::Counter, "PRTG.No", 1.0, 1.0, true),
    entry("Byte", ObservationKind::Numeric, "PRTG.MByte", 1.0 / MIB, 1.0 / MIB, false),
    entry("KByte", ObservationKind::Numeric, "PRTG.MByte", 1.0 / MIB, 1.0 / 1024.0, false),
    entry("MByte", ObservationKind::Numeric, "PRTG.MByte", 1.0 / MIB, 1.0, false),
    entry("GByte", ObservationKind::Numeric, "PRTG.MByte", 1.0 / MIB, 1024.0, false),
    entry("kbit/s", ObservationKind::Rate, "PRTG.kBitSec", 0.008, 1.0, true),
    entry("Mbit/s", ObservationKind::Rate, "PRTG.MBitSec", 0.000_008, 1.0, true),
    entry("#/s", ObservationKind::Rate, "PRTG.IpS", 1.0, 1.0, true),
    entry("items/sec", ObservationKind::Rate, "PRTG.IpS", 1.0, 1.0, true),
    entry("#/min", ObservationKind::Rate, "PRTG.IpM", 1.0, 1.0, true),
    entry("items/min", ObservationKind::Rate, "PRTG.IpM", 1.0, 1.0, true),
    entry("items", ObservationKind::Counter, "PRTG.Items", 1.0, 1.0, true),
];

/// 未登记单位的退化规则：通用数值，无显示配置。
pub const GENERIC: UnitSpec = UnitSpec {
    unit: "",
    kind: ObservationKind::Numeric,
    profile: None,
    raw_scale: 1.0,
    text_scale: 1.0,
    integer: false,
};

pub fn lookup(unit: &str) -> Option<&'static UnitSpec> {
    let unit = unit.trim();
    UNIT_TABLE
        .iter()
        .find(|entry| entry.unit == unit)
        .or_else(|| {
            UNIT_TABLE
                .iter()
                .find(|entry| entry.unit.eq_ignore_ascii_case(unit))
        })
}

/// 显示配置定义。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayProfile {
    pub name: &'static str,
    pub float: bool,
    pub suffix: &'static str,
    pub min: f64,
    pub max: f64,
    pub digits: u8,
}

const fn profile(
    name: &'static str,
    float: bool,
    suffix: &'static str,
    max: f64,
    digits: u8,
) -> DisplayProfile {
    DisplayProfile {
        name,
        float,
        suffix,
        min: 0.0,
        max,
        digits,
    }
}

const PROFILES: &[DisplayProfile] = &[
    profile("PRTG.ms", true, " ms", 0.0, 2),
    profile("PRTG.Intensity", true, " %", 100.0, 2),
    profile("PRTG.No", false, " #", 0.0, 0),
    profile("PRTG.MByte", true, " MByte", 0.0, 2),
    profile("PRTG.Sec", false, " sec", 0.0, 0),
    profile("PRTG.MBitSec", false, " Mbit/sec", 0.0, 0),
    profile("PRTG.kBitSec", false, " kbit/sec", 0.0, 0),
    profile("PRTG.IpS", false, " Items/sec", 0.0, 0),
    profile("PRTG.IpM", false, " Items/min", 0.0, 0),
    profile("PRTG.Items", false, " Items", 0.0, 0),
];

/// 解码器可能推荐的全部显示配置（宿主据此预先注册）。
pub fn profiles() -> &'static [DisplayProfile] {
    PROFILES
}

pub fn find_profile(name: &str) -> Option<&'static DisplayProfile> {
    PROFILES.iter().find(|profile| profile.name == name)
}

#[cfg(test)]
mod tests {
    use super::{UNIT_TABLE, find_profile, lookup};

    #[test]
    fn every_unit_points_at_a_known_profile() {
        for entry in UNIT_TABLE {
            let profile = entry.profile.expect("profile");
            let found = find_profile(profile).expect(profile);
            assert_eq!(found.float, !entry.integer, "{}", entry.unit);
        }
    }

    #[test]
    fn lookup_is_exact_before_case_insensitive() {
        assert_eq!(lookup("Mbit/s").map(|entry| entry.unit), Some("Mbit/s"));
        assert_eq!(lookup("MBIT/S").map(|entry| entry.unit), Some("Mbit/s"));
        assert_eq!(lookup("Items/sec").map(|entry| entry.unit), Some("items/sec"));
        assert!(lookup("furlong").is_none());
    }
}
