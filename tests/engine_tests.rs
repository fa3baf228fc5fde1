use ecusim::codec::FrameCodec;
use ecusim::config::SimulatorConfig;
use ecusim::dtc::{self, ActiveDtcSet, DtcCatalog, DtcSpec, OVERHEAT_CODE};
use ecusim::error::{EngineError, SourceError};
use ecusim::engine::{
    fault_readings, shutdown_readings, EngineSimulator, EngineState, Lifecycle, RandomSource,
    ReadingSource,
};
use ecusim::readings::ReadingSet;
use ecusim::signals::SignalCatalog;
use std::sync::Arc;

fn seeded(seed: u64) -> EngineSimulator {
    EngineSimulator::new(&SimulatorConfig {
        seed: Some(seed),
        ..SimulatorConfig::default()
    })
}

/// Source that overheats as soon as the engine runs.
fn overheating(state: EngineState) -> ReadingSet {
    match state {
        EngineState::Cranking => ReadingSet::new().with("rpm", 350.0),
        EngineState::Running => ReadingSet::new()
            .with("rpm", 5200.0)
            .with("speed", 180.0)
            .with("coolant_temp", 110.0)
            .with("oil_pressure", 3.1)
            .with("throttle_position", 95.0)
            .with("fuel_level", 40.0)
            .with("battery_voltage", 13.6),
        EngineState::Fault => fault_readings(),
        EngineState::Shutdown => shutdown_readings(),
        EngineState::Off => ReadingSet::new(),
    }
}

fn overheating_engine(dtcs: DtcCatalog) -> EngineSimulator<fn(EngineState) -> ReadingSet> {
    EngineSimulator::with_parts(
        Arc::new(SignalCatalog::engine()),
        Arc::new(dtcs),
        overheating as fn(EngineState) -> ReadingSet,
        OVERHEAT_CODE,
    )
}

fn run<S: ReadingSource>(engine: &mut EngineSimulator<S>, ticks: usize) {
    for _ in 0..ticks {
        engine.tick().unwrap();
    }
}

#[test]
fn test_initial_state() {
    let engine = seeded(1);
    assert_eq!(engine.state(), EngineState::Off);
    assert_eq!(engine.dwell_counter(), 0);
    assert_eq!(engine.tick_count(), 0);
    assert!(engine.latest().is_none());
}

#[test]
fn test_dwell_off_then_cranking() {
    let mut engine = seeded(1);

    for expected_dwell in 1..=4 {
        engine.tick().unwrap();
        assert_eq!(engine.state(), EngineState::Off);
        assert_eq!(engine.dwell_counter(), expected_dwell);
    }
    engine.tick().unwrap();
    assert_eq!(engine.state(), EngineState::Cranking);
    assert_eq!(engine.dwell_counter(), 0);

    run(&mut engine, 4);
    assert_eq!(engine.state(), EngineState::Cranking);
    engine.tick().unwrap();
    assert_eq!(engine.state(), EngineState::Running);
    assert_eq!(engine.dwell_counter(), 0);
}

#[test]
fn test_overheat_moves_running_to_fault() {
    let mut engine = overheating_engine(DtcCatalog::engine());
    run(&mut engine, 10);
    assert_eq!(engine.state(), EngineState::Running);

    let snapshot = engine.tick().unwrap();
    assert!(snapshot.active_dtcs.contains(OVERHEAT_CODE));
    assert_eq!(snapshot.state, EngineState::Fault);
    assert_eq!(engine.state(), EngineState::Fault);
    assert_eq!(engine.dwell_counter(), 0);
}

#[test]
fn test_full_cycle_returns_to_off() {
    let mut engine = overheating_engine(DtcCatalog::engine());
    run(&mut engine, 11);
    assert_eq!(engine.state(), EngineState::Fault);

    run(&mut engine, 6);
    assert_eq!(engine.state(), EngineState::Fault);
    assert_eq!(engine.dwell_counter(), 6);
    engine.tick().unwrap();
    assert_eq!(engine.state(), EngineState::Shutdown);

    run(&mut engine, 5);
    assert_eq!(engine.state(), EngineState::Shutdown);
    engine.tick().unwrap();
    assert_eq!(engine.state(), EngineState::Off);
    assert_eq!(engine.tick_count(), 24);

    run(&mut engine, 5);
    assert_eq!(engine.state(), EngineState::Cranking);
}

#[test]
fn test_missing_fault_code_never_faults() {
    fn coolant_low(r: &ReadingSet) -> bool {
        r.value("coolant_temp") < 70.0
    }
    let without_overheat = DtcCatalog::new(vec![DtcSpec::new(
        "P0128",
        "Coolant Temperature Below Thermostat Regulating Temperature",
        coolant_low,
    )])
    .unwrap();

    let mut engine = overheating_engine(without_overheat);
    run(&mut engine, 10);
    for _ in 0..50 {
        let snapshot = engine.tick().unwrap();
        assert_eq!(snapshot.state, EngineState::Running);
        assert!(!snapshot.active_dtcs.contains(OVERHEAT_CODE));
    }
}

#[test]
fn test_unknown_fault_code_config() {
    let mut engine = EngineSimulator::with_parts(
        Arc::new(SignalCatalog::engine()),
        Arc::new(DtcCatalog::engine()),
        overheating as fn(EngineState) -> ReadingSet,
        "P9999",
    );
    run(&mut engine, 30);
    assert_eq!(engine.state(), EngineState::Running);
    assert_eq!(engine.fault_code(), "P9999");
}

#[test]
fn test_off_snapshot_is_default_filled() {
    let mut engine = seeded(3);
    let snapshot = engine.tick().unwrap();

    assert_eq!(snapshot.tick, 1);
    assert_eq!(snapshot.readings.len(), 7);
    assert!(snapshot.readings.iter().all(|(_, v)| v == 0.0));
    assert_eq!(snapshot.frame.to_hex().as_str(), "0000002800000000");
    assert_eq!(snapshot.active_dtcs.codes(), &["P0128", "P0522", "P0562"]);
}

#[test]
fn test_cranking_produces_only_rpm() {
    let mut engine = seeded(4);
    run(&mut engine, 5);
    for _ in 0..5 {
        let snapshot = engine.tick().unwrap();
        let rpm = snapshot.readings.value("rpm");
        assert!((200.0..=500.0).contains(&rpm), "cranking rpm {rpm}");
        assert_eq!(snapshot.readings.value("speed"), 0.0);
        assert_eq!(snapshot.readings.value("coolant_temp"), 0.0);
    }
}

#[test]
fn test_running_readings_stay_in_range() {
    let mut source = RandomSource::from_seed(99);
    for _ in 0..500 {
        let r = source.synthesize(EngineState::Running).unwrap();
        assert_eq!(r.len(), 7);
        assert!((800.0..=6500.0).contains(&r.value("rpm")));
        assert!((0.0..=250.0).contains(&r.value("speed")));
        assert!((70.0..=110.0).contains(&r.value("coolant_temp")));
        assert!((1.5..=4.5).contains(&r.value("oil_pressure")));
        assert!((0.0..=100.0).contains(&r.value("throttle_position")));
        assert!((0.0..=100.0).contains(&r.value("fuel_level")));
        assert!((11.5..=14.8).contains(&r.value("battery_voltage")));
        assert_eq!(r.value("rpm").fract(), 0.0);
    }
}

#[test]
fn test_fixed_state_readings() {
    let mut source = RandomSource::from_seed(5);
    assert!(source.synthesize(EngineState::Off).unwrap().is_empty());
    assert_eq!(source.synthesize(EngineState::Fault).unwrap(), fault_readings());
    assert_eq!(source.synthesize(EngineState::Shutdown).unwrap(), shutdown_readings());
    assert_eq!(fault_readings().value("coolant_temp"), 120.0);
    assert_eq!(shutdown_readings().value("coolant_temp"), 60.0);
}

#[test]
fn test_snapshots_are_tick_consistent() {
    let mut engine = seeded(2024);
    let codec = FrameCodec::new(Arc::new(SignalCatalog::engine()));
    let catalog = DtcCatalog::engine();

    for _ in 0..300 {
        let snapshot = engine.tick().unwrap();
        assert_eq!(codec.encode(&snapshot.readings).unwrap(), snapshot.frame);
        assert_eq!(dtc::evaluate(&snapshot.readings, &catalog), snapshot.active_dtcs);
        assert_eq!(engine.latest().as_deref(), Some(&*snapshot));
    }
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let mut a = seeded(11);
    let mut b = seeded(11);
    for _ in 0..100 {
        assert_eq!(*a.tick().unwrap(), *b.tick().unwrap());
    }
}

#[test]
fn test_lifecycle_advance_is_pure() {
    let quiet = ActiveDtcSet::default();
    let overheat = dtc::evaluate(
        &ReadingSet::new().with("coolant_temp", 108.0).with("throttle_position", 92.0),
        &DtcCatalog::engine(),
    );

    assert_eq!(
        Lifecycle::at(EngineState::Off, 4).advance(&quiet, OVERHEAT_CODE),
        Lifecycle::at(EngineState::Cranking, 0)
    );
    assert_eq!(
        Lifecycle::at(EngineState::Off, 3).advance(&overheat, OVERHEAT_CODE),
        Lifecycle::at(EngineState::Off, 4)
    );
    assert_eq!(
        Lifecycle::at(EngineState::Running, 0).advance(&overheat, OVERHEAT_CODE),
        Lifecycle::at(EngineState::Fault, 0)
    );
    assert_eq!(
        Lifecycle::at(EngineState::Fault, 6).advance(&quiet, OVERHEAT_CODE),
        Lifecycle::at(EngineState::Shutdown, 0)
    );
    assert_eq!(
        Lifecycle::at(EngineState::Shutdown, 5).advance(&quiet, OVERHEAT_CODE),
        Lifecycle::at(EngineState::Off, 0)
    );
}

#[test]
fn test_state_serializes_as_upper_case_name() {
    assert_eq!(serde_json::to_string(&EngineState::Shutdown).unwrap(), "\"SHUTDOWN\"");
    let state: EngineState = serde_json::from_str("\"CRANKING\"").unwrap();
    assert_eq!(state, EngineState::Cranking);
}

#[test]
fn test_failed_tick_leaves_engine_untouched() {
    let mut calls = 0u32;
    let flaky = move |state: EngineState| -> Result<ReadingSet, SourceError> {
        calls += 1;
        if calls == 3 {
            Err(SourceError("coolant sensor open circuit".into()))
        } else {
            Ok(overheating(state))
        }
    };
    struct Flaky<F>(F);
    impl<F: FnMut(EngineState) -> Result<ReadingSet, SourceError>> ReadingSource for Flaky<F> {
        fn synthesize(&mut self, state: EngineState) -> Result<ReadingSet, SourceError> {
            (self.0)(state)
        }
    }

    let mut engine = EngineSimulator::with_parts(
        Arc::new(SignalCatalog::engine()),
        Arc::new(DtcCatalog::engine()),
        Flaky(flaky),
        OVERHEAT_CODE,
    );
    run(&mut engine, 2);
    let before = engine.lifecycle();
    let latest = engine.latest();

    let err = engine.tick().unwrap_err();
    assert!(matches!(err, EngineError::Source(SourceError(ref reason)) if reason.contains("open circuit")));
    assert_eq!(engine.lifecycle(), before);
    assert_eq!(engine.tick_count(), 2);
    assert_eq!(engine.latest(), latest);

    let next = engine.tick().unwrap();
    assert_eq!(next.tick, 3);
    assert_eq!(engine.dwell_counter(), before.dwell_counter + 1);
}
