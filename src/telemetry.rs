//! Snapshot publication for concurrent readers.
//!
//! The tick task is the only writer. Each tick it swaps in a complete
//! [`EngineSnapshot`] behind an `Arc`, so a reader always sees the frame,
//! state and DTC list of one and the same tick.

use crate::codec::{Frame, FrameCodec};
use crate::dtc::{self, ActiveDtcSet, DtcCatalog};
use crate::engine::EngineState;
use crate::error::CodecError;
use crate::readings::ReadingSet;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub tick: u64,
    pub state: EngineState,
    pub frame: Frame,
    pub active_dtcs: ActiveDtcSet,
    pub readings: ReadingSet,
}

impl EngineSnapshot {
    /// Snapshot published before the first tick: OFF at tick 0, with the
    /// frame and codes of an empty, default-filled reading set.
    pub fn initial(codec: &FrameCodec, dtcs: &DtcCatalog) -> Result<Self, CodecError> {
        let readings = ReadingSet::new().filled(codec.catalog());
        let frame = codec.encode(&readings)?;
        let active_dtcs = dtc::evaluate(&readings, dtcs);
        Ok(Self {
            tick: 0,
            state: EngineState::Off,
            frame,
            active_dtcs,
            readings,
        })
    }
}

/// Create a connected publisher/reader pair seeded with `initial`.
pub fn channel(initial: EngineSnapshot) -> (TelemetryPublisher, TelemetryReader) {
    let (tx, rx) = watch::channel(Arc::new(initial));
    (TelemetryPublisher { tx }, TelemetryReader { rx })
}

#[derive(Debug)]
pub struct TelemetryPublisher {
    tx: watch::Sender<Arc<EngineSnapshot>>,
}

impl TelemetryPublisher {
    /// Replace the published snapshot. Succeeds with no readers attached.
    pub fn publish(&self, snapshot: Arc<EngineSnapshot>) {
        self.tx.send_replace(snapshot);
    }

    pub fn subscribe(&self) -> TelemetryReader {
        TelemetryReader { rx: self.tx.subscribe() }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryReader {
    rx: watch::Receiver<Arc<EngineSnapshot>>,
}

impl TelemetryReader {
    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        Arc::clone(&self.rx.borrow())
    }

    pub fn get_engine_frame(&self) -> String {
        self.snapshot().frame.to_hex().to_string()
    }

    pub fn get_active_dtcs(&self) -> Vec<String> {
        self.snapshot().active_dtcs.to_strings()
    }

    pub fn get_engine_state(&self) -> String {
        self.snapshot().state.as_str().to_string()
    }

    /// Wait for the next published snapshot. `None` once the publisher is gone.
    pub async fn next(&mut self) -> Option<Arc<EngineSnapshot>> {
        self.rx.changed().await.ok()?;
        Some(Arc::clone(&self.rx.borrow_and_update()))
    }
}
