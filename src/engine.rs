//! Engine lifecycle simulation.
//!
//! The simulator walks OFF → CRANKING → RUNNING → FAULT → SHUTDOWN → OFF.
//! Every tick it synthesizes readings for the current state, default-fills
//! them against the signal catalog, evaluates the DTC catalog, encodes the
//! frame and only then advances the lifecycle. Time-based states leave after
//! their dwell limit; RUNNING leaves only when the fault trigger code is
//! active for the readings produced in that same tick.

use crate::codec::FrameCodec;
use crate::config::SimulatorConfig;
use crate::dtc::{self, DtcCatalog};
use crate::error::{EngineError, SourceError};
use crate::readings::{round1, ReadingSet};
use crate::signals::{
    SignalCatalog, BATTERY_VOLTAGE, COOLANT_TEMP, FUEL_LEVEL, OIL_PRESSURE, RPM, SPEED,
    THROTTLE_POSITION,
};
use crate::telemetry::EngineSnapshot;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineState {
    Off,
    Cranking,
    Running,
    Fault,
    Shutdown,
}

impl EngineState {
    pub const ALL: [EngineState; 5] = [
        EngineState::Off,
        EngineState::Cranking,
        EngineState::Running,
        EngineState::Fault,
        EngineState::Shutdown,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            EngineState::Off => "OFF",
            EngineState::Cranking => "CRANKING",
            EngineState::Running => "RUNNING",
            EngineState::Fault => "FAULT",
            EngineState::Shutdown => "SHUTDOWN",
        }
    }

    /// Ticks a state may accumulate before it is left; `None` for RUNNING.
    pub const fn dwell_limit(self) -> Option<u32> {
        match self {
            EngineState::Off | EngineState::Cranking => Some(4),
            EngineState::Running => None,
            EngineState::Fault => Some(6),
            EngineState::Shutdown => Some(5),
        }
    }

    pub const fn successor(self) -> EngineState {
        match self {
            EngineState::Off => EngineState::Cranking,
            EngineState::Cranking => EngineState::Running,
            EngineState::Running => EngineState::Fault,
            EngineState::Fault => EngineState::Shutdown,
            EngineState::Shutdown => EngineState::Off,
        }
    }
}

impl core::fmt::Display for EngineState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for EngineState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngineState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown engine state '{s}'"))
    }
}

/// Current state plus ticks spent in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub state: EngineState,
    pub dwell_counter: u32,
}

impl Lifecycle {
    pub const fn new() -> Self {
        Self {
            state: EngineState::Off,
            dwell_counter: 0,
        }
    }

    pub const fn at(state: EngineState, dwell_counter: u32) -> Self {
        Self { state, dwell_counter }
    }

    /// Lifecycle after one tick whose diagnostics produced `active`.
    #[must_use]
    pub fn advance(self, active: &dtc::ActiveDtcSet, fault_code: &str) -> Self {
        match self.state.dwell_limit() {
            None => {
                if active.contains(fault_code) {
                    Self::at(self.state.successor(), 0)
                } else {
                    self
                }
            }
            Some(limit) => {
                let dwell = self.dwell_counter.saturating_add(1);
                if dwell > limit {
                    Self::at(self.state.successor(), 0)
                } else {
                    Self::at(self.state, dwell)
                }
            }
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Produces the partial reading set for a lifecycle state.
///
/// An `Err` fails the whole tick: nothing is encoded, evaluated or advanced.
pub trait ReadingSource {
    fn synthesize(&mut self, state: EngineState) -> Result<ReadingSet, SourceError>;
}

impl<F> ReadingSource for F
where
    F: FnMut(EngineState) -> ReadingSet,
{
    fn synthesize(&mut self, state: EngineState) -> Result<ReadingSet, SourceError> {
        Ok(self(state))
    }
}

/// Degraded readings held while in FAULT.
pub fn fault_readings() -> ReadingSet {
    ReadingSet::new()
        .with(RPM, 0.0)
        .with(SPEED, 0.0)
        .with(COOLANT_TEMP, 120.0)
        .with(OIL_PRESSURE, 0.5)
        .with(THROTTLE_POSITION, 0.0)
        .with(FUEL_LEVEL, 50.0)
        .with(BATTERY_VOLTAGE, 11.9)
}

/// Cool-down readings held while in SHUTDOWN.
pub fn shutdown_readings() -> ReadingSet {
    ReadingSet::new()
        .with(RPM, 0.0)
        .with(SPEED, 0.0)
        .with(COOLANT_TEMP, 60.0)
        .with(OIL_PRESSURE, 0.0)
        .with(THROTTLE_POSITION, 0.0)
        .with(FUEL_LEVEL, 50.0)
        .with(BATTERY_VOLTAGE, 12.4)
}

/// Independent uniform draws per signal per tick.
#[derive(Debug)]
pub struct RandomSource<R = StdRng> {
    rng: R,
}

impl RandomSource<StdRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<R: Rng> RandomSource<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> ReadingSource for RandomSource<R> {
    fn synthesize(&mut self, state: EngineState) -> Result<ReadingSet, SourceError> {
        let rng = &mut self.rng;
        let readings = match state {
            EngineState::Off => ReadingSet::new(),
            EngineState::Cranking => {
                ReadingSet::new().with(RPM, f64::from(rng.gen_range(200_u16..=500)))
            }
            EngineState::Running => ReadingSet::new()
                .with(RPM, f64::from(rng.gen_range(800_u16..=6500)))
                .with(SPEED, f64::from(rng.gen_range(0_u16..=250)))
                .with(COOLANT_TEMP, f64::from(rng.gen_range(70_i16..=110)))
                .with(OIL_PRESSURE, round1(rng.gen_range(1.5..=4.5)))
                .with(THROTTLE_POSITION, round1(rng.gen_range(0.0..=100.0)))
                .with(FUEL_LEVEL, round1(rng.gen_range(0.0..=100.0)))
                .with(BATTERY_VOLTAGE, round1(rng.gen_range(11.5..=14.8))),
            EngineState::Fault => fault_readings(),
            EngineState::Shutdown => shutdown_readings(),
        };
        Ok(readings)
    }
}

/// One simulated ECU. Owns its lifecycle; nothing else mutates it.
pub struct EngineSimulator<S = RandomSource> {
    lifecycle: Lifecycle,
    codec: FrameCodec,
    dtcs: Arc<DtcCatalog>,
    source: S,
    fault_code: String,
    tick_count: u64,
    latest: Option<Arc<EngineSnapshot>>,
}

impl EngineSimulator<RandomSource> {
    /// Engine catalogs with a random source seeded from `config`.
    pub fn new(config: &SimulatorConfig) -> Self {
        let source = match config.seed {
            Some(seed) => RandomSource::from_seed(seed),
            None => RandomSource::from_entropy(),
        };
        Self::with_parts(
            Arc::new(SignalCatalog::engine()),
            Arc::new(DtcCatalog::engine()),
            source,
            &config.fault_trigger_code,
        )
    }
}

impl<S: ReadingSource> EngineSimulator<S> {
    pub fn with_parts(
        signals: Arc<SignalCatalog>,
        dtcs: Arc<DtcCatalog>,
        source: S,
        fault_code: &str,
    ) -> Self {
        if !dtcs.contains(fault_code) {
            warn!(fault_code, "fault trigger code is not in the DTC catalog, FAULT is unreachable");
        }
        Self {
            lifecycle: Lifecycle::new(),
            codec: FrameCodec::new(signals),
            dtcs,
            source,
            fault_code: fault_code.to_string(),
            tick_count: 0,
            latest: None,
        }
    }

    /// Run one simulation cycle and return the snapshot it produced.
    ///
    /// A source or codec failure leaves the lifecycle, tick count and latest
    /// snapshot untouched.
    pub fn tick(&mut self) -> Result<Arc<EngineSnapshot>, EngineError> {
        let producing = self.lifecycle.state;
        let readings = self.source.synthesize(producing)?.filled(self.codec.catalog());
        let active_dtcs = dtc::evaluate(&readings, &self.dtcs);
        let frame = self.codec.encode(&readings)?;

        let next = self.lifecycle.advance(&active_dtcs, &self.fault_code);
        self.tick_count += 1;
        if next.state != producing {
            info!(
                tick = self.tick_count,
                from = %producing,
                to = %next.state,
                dtcs = ?active_dtcs.codes(),
                "engine state transition"
            );
        }
        self.lifecycle = next;

        debug!(
            tick = self.tick_count,
            state = %next.state,
            dwell = next.dwell_counter,
            frame = %frame,
            "tick complete"
        );

        let snapshot = Arc::new(EngineSnapshot {
            tick: self.tick_count,
            state: next.state,
            frame,
            active_dtcs,
            readings,
        });
        self.latest = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    pub fn state(&self) -> EngineState {
        self.lifecycle.state
    }

    pub fn dwell_counter(&self) -> u32 {
        self.lifecycle.dwell_counter
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn latest(&self) -> Option<Arc<EngineSnapshot>> {
        self.latest.clone()
    }

    pub fn codec(&self) -> &FrameCodec {
        &self.codec
    }

    pub fn dtc_catalog(&self) -> &DtcCatalog {
        &self.dtcs
    }

    pub fn fault_code(&self) -> &str {
        &self.fault_code
    }
}
