use crate::dtc::OVERHEAT_CODE;
use crate::error::ConfigError;
use crate::validation::WarningThresholds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// Reference cadence: two frames per second
const DEFAULT_TICK_PERIOD_MS: u64 = 500;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7100";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub tick_period_ms: u64,
    pub fault_trigger_code: String,
    /// Fixed RNG seed for reproducible runs; entropy when unset.
    pub seed: Option<u64>,
}

impl SimulatorConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.max(1))
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            fault_trigger_code: OVERHEAT_CODE.to_string(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub snapshot_path: Option<PathBuf>,
    /// Stop the tick loop on the first failed tick instead of skipping it.
    pub halt_on_error: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            snapshot_path: None,
            halt_on_error: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcuConfig {
    pub simulator: SimulatorConfig,
    pub service: ServiceConfig,
    pub thresholds: WarningThresholds,
}

impl EcuConfig {
    /// Load a JSON config file. Missing sections fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}
