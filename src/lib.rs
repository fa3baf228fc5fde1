//! # ECU Simulator
//!
//! A simulated engine control unit: synthetic sensor readings packed into a
//! CAN-style frame, a five-state engine lifecycle, and diagnostic trouble
//! codes evaluated against every tick's readings.
//!
//! ## Quick Start
//!
//! ```rust
//! use ecusim::{EngineSimulator, SimulatorConfig};
//!
//! let config = SimulatorConfig { seed: Some(1), ..SimulatorConfig::default() };
//! let mut engine = EngineSimulator::new(&config);
//!
//! let snapshot = engine.tick().expect("engine catalog encodes");
//! println!("{} {} {:?}", snapshot.state, snapshot.frame, snapshot.active_dtcs.codes());
//! ```
//!
//! ## Architecture
//!
//! - [`signals`] - signal catalog and frame layout
//! - [`codec`] - frame encode/decode
//! - [`dtc`] - DTC catalog and rule engine
//! - [`engine`] - lifecycle state machine and reading synthesis
//! - [`telemetry`] - atomic snapshot publication
//! - [`protocol`] / [`service`] / [`client`] - JSON query surface over TCP
//! - [`validation`] - consumer-side warning thresholds
//! - [`persist`] - last-known-good snapshot file

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]

pub mod client;
pub mod codec;
pub mod config;
pub mod dtc;
pub mod engine;
pub mod error;
pub mod persist;
pub mod protocol;
pub mod readings;
pub mod service;
pub mod signals;
pub mod telemetry;
pub mod validation;

// Re-export main public types for convenience
pub use codec::{Frame, FrameCodec};
pub use config::{EcuConfig, ServiceConfig, SimulatorConfig};
pub use dtc::{evaluate, ActiveDtcSet, DtcCatalog, DtcSpec};
pub use engine::{EngineSimulator, EngineState, Lifecycle, RandomSource, ReadingSource};
pub use error::{CatalogError, CodecError, EngineError, SourceError};
pub use readings::ReadingSet;
pub use signals::{SignalCatalog, SignalSpec};
pub use telemetry::{EngineSnapshot, TelemetryPublisher, TelemetryReader};
