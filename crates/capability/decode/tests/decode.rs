use domain::{ChannelRecord, ObservationKind, ObservationValue};
use prtg_decode::{ChannelDecoder, profiles};
use serde_json::{Value, json};

fn record(value: Value) -> ChannelRecord {
    ChannelRecord::from_value(&value).expect("object")
}

#[test]
fn system_channels_are_remapped_or_skipped() {
    let decoder = ChannelDecoder::new();
    let downtime = decoder
        .decode(&record(json!({"objid": -3, "name": "Downtime", "lastvalue": "0 %"})))
        .expect("downtime");
    assert_eq!(downtime.identifier, 252);
    assert_eq!(downtime.source_id, -3);

    let skipped = decoder.decode(&record(json!({"objid": -5, "name": "x", "lastvalue": "1 %"})));
    assert!(skipped.is_none());

    let ordinary = decoder
        .decode(&record(json!({"objid": 2, "name": "Ping", "lastvalue": "4 msec"})))
        .expect("ordinary");
    assert_eq!(ordinary.identifier, 2);
}

#[test]
fn raw_name_overrides_display_name() {
    let decoder = ChannelDecoder::new();
    let observation = decoder
        .decode(&record(json!({
            "objid": 0,
            "name": "Verfügbarkeit",
            "name_raw": "Availability",
            "lastvalue": "100 %"
        })))
        .expect("observation");
    assert_eq!(observation.name, "Availability");
}

#[test]
fn unit_selects_kind_scale_and_profile() {
    let decoder = ChannelDecoder::new();

    let ping = decoder
        .decode(&record(json!({"objid": 1, "lastvalue": "12 msec", "lastvalue_raw": 12.4})))
        .expect("ping");
    assert_eq!(ping.kind, ObservationKind::Duration);
    assert_eq!(ping.suggested_profile, Some("PRTG.ms"));
    assert_eq!(ping.value, ObservationValue::F64(12.4));

    let traffic = decoder
        .decode(&record(json!({"objid": 3, "lastvalue": "80 kbit/s", "lastvalue_raw": 10000})))
        .expect("traffic");
    assert_eq!(traffic.kind, ObservationKind::Rate);
    assert_eq!(traffic.unit, "kbit/s");
    assert_eq!(traffic.suggested_profile, Some("PRTG.kBitSec"));
    assert_eq!(traffic.scale, 0.008);
    assert_eq!(traffic.value, ObservationValue::I64(80));

    let volume = decoder
        .decode(&record(json!({"objid": 4, "lastvalue": "2 GByte"})))
        .expect("volume");
    assert_eq!(volume.kind, ObservationKind::Numeric);
    assert_eq!(volume.suggested_profile, Some("PRTG.MByte"));
    assert_eq!(volume.value.as_f64(), Some(2048.0));

    let load = decoder
        .decode(&record(json!({"objid": 5, "lastvalue": "37,5 %"})))
        .expect("load");
    assert_eq!(load.kind, ObservationKind::Percentage);
    assert_eq!(load.value, ObservationValue::F64(37.5));
}

#[test]
fn explicit_unit_field_wins_over_formatted_suffix() {
    let decoder = ChannelDecoder::new();
    let observation = decoder
        .decode(&record(json!({"objid": 6, "lastvalue": "7", "unit": "#", "lastvalue_raw": "7"})))
        .expect("observation");
    assert_eq!(observation.kind, ObservationKind::Counter);
    assert_eq!(observation.suggested_profile, Some("PRTG.No"));
    assert_eq!(observation.value, ObservationValue::I64(7));
}

#[test]
fn unknown_unit_falls_back_to_generic_numeric() {
    let decoder = ChannelDecoder::new();
    let observation = decoder
        .decode(&record(json!({"objid": 7, "lastvalue": "21 °C", "lastvalue_raw": 21.0})))
        .expect("observation");
    assert_eq!(observation.kind, ObservationKind::Numeric);
    assert_eq!(observation.unit, "°C");
    assert_eq!(observation.suggested_profile, None);
    assert_eq!(observation.scale, 1.0);
}

#[test]
fn text_values_become_boolean_or_string() {
    let decoder = ChannelDecoder::new();
    let flag = decoder
        .decode(&record(json!({"objid": 8, "lastvalue": "Yes"})))
        .expect("flag");
    assert_eq!(flag.kind, ObservationKind::Boolean);
    assert_eq!(flag.value, ObservationValue::Bool(true));

    let text = decoder
        .decode(&record(json!({"objid": 9, "lastvalue": "running"})))
        .expect("text");
    assert_eq!(text.kind, ObservationKind::String);
    assert_eq!(text.value, ObservationValue::String("running".to_string()));
}

#[test]
fn one_bad_channel_does_not_block_the_batch() {
    let decoder = ChannelDecoder::new();
    let rows = vec![
        json!({"objid": 1, "name": "Ping", "lastvalue": "4 msec"}),
        json!({"name": "no id", "lastvalue": "1 %"}),
        json!({"objid": 2, "name": "empty", "lastvalue": ""}),
        json!("not an object"),
        json!({"objid": -4, "lastvalue": "0 %"}),
        json!({"objid": -1, "name": "Downtime", "lastvalue": "0 %"}),
    ];
    let observations = decoder.decode_all(&rows);
    let ids: Vec<i64> = observations.iter().map(|o| o.identifier).collect();
    assert_eq!(ids, vec![1, 254]);
}

#[test]
fn profile_table_is_complete() {
    let names: Vec<&str> = profiles().iter().map(|profile| profile.name).collect();
    assert_eq!(
        names,
        vec![
            "PRTG.ms",
            "PRTG.Intensity",
            "PRTG.No",
            "PRTG.MByte",
            "PRTG.Sec",
            "PRTG.MBitSec",
            "PRTG.kBitSec",
            "PRTG.IpS",
            "PRTG.IpM",
            "PRTG.Items",
        ]
    );
    let intensity = profiles()
        .iter()
        .find(|profile| profile.name == "PRTG.Intensity")
        .expect("intensity");
    assert_eq!(intensity.max, 100.0);
    assert_eq!(intensity.suffix, " %");
}

#[test]
fn grouped_formatted_value_follows_unit() {
    let decoder = ChannelDecoder::new();
    let traffic = decoder
        .decode(&record(json!({"objid": 11, "lastvalue": "1.024 kbit/s"})))
        .expect("traffic");
    assert_eq!(traffic.value, ObservationValue::I64(1024));

    let latency = decoder
        .decode(&record(json!({"objid": 12, "lastvalue": "1.024 msec"})))
        .expect("latency");
    assert_eq!(latency.value, ObservationValue::F64(1.024));

    let raw_wins = decoder
        .decode(&record(json!({"objid": 13, "lastvalue": "1.024 msec", "lastvalue_raw": 1024})))
        .expect("raw");
    assert_eq!(raw_wins.value, ObservationValue::F64(1024.0));
}
