//! Last-known-good snapshot file.

use crate::engine::EngineState;
use crate::error::PersistError;
use crate::readings::ReadingSet;
use crate::telemetry::EngineSnapshot;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    pub saved_at_ms: u64,
    pub tick: u64,
    pub state: EngineState,
    #[serde(with = "serde_bytes")]
    pub frame: Vec<u8>,
    pub active_dtcs: Vec<String>,
    pub readings: ReadingSet,
}

impl PersistedSnapshot {
    pub fn from_snapshot(snapshot: &EngineSnapshot) -> Self {
        let saved_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            saved_at_ms,
            tick: snapshot.tick,
            state: snapshot.state,
            frame: snapshot.frame.as_bytes().to_vec(),
            active_dtcs: snapshot.active_dtcs.to_strings(),
            readings: snapshot.readings.clone(),
        }
    }

    pub fn frame_hex(&self) -> String {
        hex::encode(&self.frame)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `snapshot` next to `path` and rename it into place.
pub fn save(path: &Path, snapshot: &EngineSnapshot) -> Result<(), PersistError> {
    let record = PersistedSnapshot::from_snapshot(snapshot);
    let json = serde_json::to_vec_pretty(&record)?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Read a saved snapshot; `Ok(None)` when no file exists yet.
pub fn load(path: &Path) -> Result<Option<PersistedSnapshot>, PersistError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
