//! Consumer-side checks on a decoded frame.
//!
//! These thresholds are an informational overlay for whoever reads the
//! frame back. They do not feed the DTC catalog or the lifecycle.

use crate::codec::FrameCodec;
use crate::error::CodecError;
use crate::readings::ReadingSet;
use crate::signals::{
    BATTERY_VOLTAGE, COOLANT_TEMP, FUEL_LEVEL, OIL_PRESSURE, RPM, THROTTLE_POSITION,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningThresholds {
    pub rpm_max: f64,
    pub coolant_temp_max: f64,
    pub oil_pressure_min: f64,
    pub oil_pressure_max: f64,
    pub throttle_position_max: f64,
    pub fuel_level_min: f64,
    pub battery_voltage_min: f64,
}

impl Default for WarningThresholds {
    fn default() -> Self {
        Self {
            rpm_max: 6000.0,
            coolant_temp_max: 105.0,
            oil_pressure_min: 1.5,
            oil_pressure_max: 4.5,
            throttle_position_max: 90.0,
            fuel_level_min: 10.0,
            battery_voltage_min: 12.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Warning {
    Above { limit: f64 },
    Below { limit: f64 },
}

impl core::fmt::Display for Warning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Warning::Above { limit } => write!(f, "above {limit}"),
            Warning::Below { limit } => write!(f, "below {limit}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalReport {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub warning: Option<Warning>,
}

impl WarningThresholds {
    /// Check one signal. Signals without a threshold never warn.
    pub fn check(&self, name: &str, value: f64) -> Option<Warning> {
        match name {
            RPM if value > self.rpm_max => Some(Warning::Above { limit: self.rpm_max }),
            COOLANT_TEMP if value > self.coolant_temp_max => {
                Some(Warning::Above { limit: self.coolant_temp_max })
            }
            OIL_PRESSURE if value < self.oil_pressure_min => {
                Some(Warning::Below { limit: self.oil_pressure_min })
            }
            OIL_PRESSURE if value > self.oil_pressure_max => {
                Some(Warning::Above { limit: self.oil_pressure_max })
            }
            THROTTLE_POSITION if value > self.throttle_position_max => {
                Some(Warning::Above { limit: self.throttle_position_max })
            }
            FUEL_LEVEL if value < self.fuel_level_min => {
                Some(Warning::Below { limit: self.fuel_level_min })
            }
            BATTERY_VOLTAGE if value < self.battery_voltage_min => {
                Some(Warning::Below { limit: self.battery_voltage_min })
            }
            _ => None,
        }
    }

    /// One report per catalog signal, in catalog order.
    pub fn inspect(&self, codec: &FrameCodec, readings: &ReadingSet) -> Vec<SignalReport> {
        codec
            .catalog()
            .signals()
            .iter()
            .map(|spec| {
                let value = readings.value(&spec.name);
                SignalReport {
                    name: spec.name.clone(),
                    value,
                    unit: spec.unit.clone(),
                    warning: self.check(&spec.name, value),
                }
            })
            .collect()
    }

    /// Decode a hex frame and inspect it.
    pub fn inspect_hex(&self, codec: &FrameCodec, hex_frame: &str) -> Result<Vec<SignalReport>, CodecError> {
        let readings = codec.decode_hex(hex_frame)?;
        Ok(self.inspect(codec, &readings))
    }
}

/// `coolant_temp` → `Coolant Temp`.
pub fn display_name(signal: &str) -> String {
    signal
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
