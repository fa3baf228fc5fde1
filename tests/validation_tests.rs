use ecusim::codec::FrameCodec;
use ecusim::readings::ReadingSet;
use ecusim::validation::{display_name, Warning, WarningThresholds};

fn nominal() -> ReadingSet {
    ReadingSet::new()
        .with("rpm", 2500.0)
        .with("speed", 100.0)
        .with("coolant_temp", 90.0)
        .with("oil_pressure", 3.0)
        .with("throttle_position", 30.0)
        .with("fuel_level", 60.0)
        .with("battery_voltage", 13.9)
}

#[test]
fn test_check_limits_are_strict() {
    let t = WarningThresholds::default();
    assert_eq!(t.check("rpm", 6000.0), None);
    assert_eq!(t.check("rpm", 6001.0), Some(Warning::Above { limit: 6000.0 }));
    assert_eq!(t.check("coolant_temp", 105.5), Some(Warning::Above { limit: 105.0 }));
    assert_eq!(t.check("oil_pressure", 1.5), None);
    assert_eq!(t.check("oil_pressure", 1.4), Some(Warning::Below { limit: 1.5 }));
    assert_eq!(t.check("oil_pressure", 4.6), Some(Warning::Above { limit: 4.5 }));
    assert_eq!(t.check("throttle_position", 90.5), Some(Warning::Above { limit: 90.0 }));
    assert_eq!(t.check("fuel_level", 9.5), Some(Warning::Below { limit: 10.0 }));
    assert_eq!(t.check("battery_voltage", 11.9), Some(Warning::Below { limit: 12.0 }));
    assert_eq!(t.check("speed", 250.0), None);
    assert_eq!(t.check("unknown", -1.0), None);
}

#[test]
fn test_inspect_hex_flags_overspeed() {
    let codec = FrameCodec::default();
    let hex_frame = codec.encode_hex(&nominal().with("rpm", 6500.0)).unwrap();
    assert_eq!(hex_frame, "641964821e3c788b");

    let reports = WarningThresholds::default().inspect_hex(&codec, &hex_frame).unwrap();
    assert_eq!(reports.len(), 7);
    assert_eq!(reports[0].name, "rpm");
    assert_eq!(reports[0].value, 6500.0);
    assert_eq!(reports[0].warning, Some(Warning::Above { limit: 6000.0 }));
    assert!(reports[1..].iter().all(|r| r.warning.is_none()));
    assert_eq!(reports[6].unit, "V");
}

#[test]
fn test_inspect_zero_frame() {
    let codec = FrameCodec::default();
    let reports = WarningThresholds::default().inspect_hex(&codec, "0000002800000000").unwrap();
    let warned: Vec<&str> = reports
        .iter()
        .filter(|r| r.warning.is_some())
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(warned, ["oil_pressure", "fuel_level", "battery_voltage"]);
}

#[test]
fn test_inspect_hex_rejects_bad_input() {
    let codec = FrameCodec::default();
    let thresholds = WarningThresholds::default();
    assert!(thresholds.inspect_hex(&codec, "not hex").is_err());
    assert!(thresholds.inspect_hex(&codec, "e803").is_err());
}

#[test]
fn test_custom_thresholds_from_json() {
    let t: WarningThresholds = serde_json::from_str(r#"{"rpm_max": 4000.0}"#).unwrap();
    assert_eq!(t.rpm_max, 4000.0);
    assert_eq!(t.coolant_temp_max, 105.0);
    assert!(t.check("rpm", 4500.0).is_some());
}

#[test]
fn test_warning_display() {
    assert_eq!(Warning::Above { limit: 6000.0 }.to_string(), "above 6000");
    assert_eq!(Warning::Below { limit: 1.5 }.to_string(), "below 1.5");
}

#[test]
fn test_display_name() {
    assert_eq!(display_name("coolant_temp"), "Coolant Temp");
    assert_eq!(display_name("rpm"), "Rpm");
    assert_eq!(display_name("throttle_position"), "Throttle Position");
}
