use ecusim::dtc::{evaluate, DtcCatalog, DtcSpec, OVERHEAT_CODE};
use ecusim::error::CatalogError;
use ecusim::readings::ReadingSet;
use ecusim::signals::SignalCatalog;

fn nominal() -> ReadingSet {
    ReadingSet::new()
        .with("rpm", 2500.0)
        .with("speed", 80.0)
        .with("coolant_temp", 90.0)
        .with("oil_pressure", 3.0)
        .with("throttle_position", 30.0)
        .with("fuel_level", 60.0)
        .with("battery_voltage", 13.9)
}

#[test]
fn test_nominal_readings_raise_nothing() {
    let active = evaluate(&nominal(), &DtcCatalog::engine());
    assert!(active.is_empty());
}

#[test]
fn test_codes_follow_catalog_order() {
    let readings = nominal()
        .with("battery_voltage", 11.6)
        .with("coolant_temp", 60.0)
        .with("throttle_position", 97.0)
        .with("oil_pressure", 1.2);
    let active = evaluate(&readings, &DtcCatalog::engine());
    assert_eq!(active.codes(), &["P0128", "P0522", "P2101", "P0562"]);
}

#[test]
fn test_thresholds_are_strict() {
    let catalog = DtcCatalog::engine();
    let edge = nominal()
        .with("coolant_temp", 70.0)
        .with("oil_pressure", 1.5)
        .with("throttle_position", 95.0)
        .with("battery_voltage", 11.8);
    assert!(evaluate(&edge, &catalog).is_empty());
}

#[test]
fn test_overheat_needs_heat_and_throttle() {
    let catalog = DtcCatalog::engine();

    let hot_idle = nominal().with("coolant_temp", 110.0).with("throttle_position", 20.0);
    assert!(!evaluate(&hot_idle, &catalog).contains(OVERHEAT_CODE));

    let hot_loaded = nominal().with("coolant_temp", 105.0).with("throttle_position", 90.0);
    let active = evaluate(&hot_loaded, &catalog);
    assert_eq!(active.codes(), &[OVERHEAT_CODE]);
}

#[test]
fn test_evaluation_has_no_memory() {
    let catalog = DtcCatalog::engine();
    let faulty = nominal().with("oil_pressure", 0.8);

    assert!(evaluate(&faulty, &catalog).contains("P0522"));
    assert!(evaluate(&nominal(), &catalog).is_empty());
    assert!(evaluate(&faulty, &catalog).contains("P0522"));
}

#[test]
fn test_default_filled_zeros() {
    let readings = ReadingSet::new().filled(&SignalCatalog::engine());
    let active = evaluate(&readings, &DtcCatalog::engine());
    assert_eq!(active.codes(), &["P0128", "P0522", "P0562"]);
}

#[test]
fn test_custom_catalog() {
    fn rpm_high(r: &ReadingSet) -> bool {
        r.value("rpm") > 6000.0
    }
    let catalog = DtcCatalog::new(vec![DtcSpec::new("P0219", "Engine Overspeed Condition", rpm_high)]).unwrap();

    assert!(catalog.contains("P0219"));
    assert!(!catalog.contains(OVERHEAT_CODE));
    assert_eq!(catalog.describe("P0219"), Some("Engine Overspeed Condition"));
    assert_eq!(evaluate(&nominal().with("rpm", 6400.0), &catalog).codes(), &["P0219"]);
}

#[test]
fn test_duplicate_codes_rejected() {
    fn never(_: &ReadingSet) -> bool {
        false
    }
    let err = DtcCatalog::new(vec![
        DtcSpec::new("P0001", "first", never),
        DtcSpec::new("P0001", "second", never),
    ])
    .unwrap_err();
    assert_eq!(err, CatalogError::DuplicateDtc("P0001".into()));
}

#[test]
fn test_engine_catalog_descriptions() {
    let catalog = DtcCatalog::engine();
    assert_eq!(catalog.len(), 5);
    assert_eq!(
        catalog.describe("P0128"),
        Some("Coolant Temperature Below Thermostat Regulating Temperature")
    );
    assert_eq!(catalog.describe("P9999"), None);
}
