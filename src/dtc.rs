//! Diagnostic trouble codes and the rule engine that evaluates them.
//!
//! Codes are recomputed from scratch on every evaluation. Nothing is
//! latched or debounced: a code that stops matching disappears on the
//! next evaluation.

use crate::error::CatalogError;
use crate::readings::ReadingSet;
use crate::signals::{BATTERY_VOLTAGE, COOLANT_TEMP, OIL_PRESSURE, THROTTLE_POSITION};
use serde::Serialize;

pub type Trigger = fn(&ReadingSet) -> bool;

/// Code that moves a running engine into FAULT.
pub const OVERHEAT_CODE: &str = "P0217";

#[derive(Clone, Serialize)]
pub struct DtcSpec {
    pub code: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub trigger: Trigger,
}

impl DtcSpec {
    pub const fn new(code: &'static str, description: &'static str, trigger: Trigger) -> Self {
        Self { code, description, trigger }
    }

    pub fn is_triggered(&self, readings: &ReadingSet) -> bool {
        (self.trigger)(readings)
    }
}

impl core::fmt::Debug for DtcSpec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DtcSpec")
            .field("code", &self.code)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

fn coolant_below_thermostat(r: &ReadingSet) -> bool {
    r.value(COOLANT_TEMP) < 70.0
}

fn oil_pressure_low(r: &ReadingSet) -> bool {
    r.value(OIL_PRESSURE) < 1.5
}

fn throttle_out_of_range(r: &ReadingSet) -> bool {
    r.value(THROTTLE_POSITION) > 95.0
}

fn coolant_over_temperature(r: &ReadingSet) -> bool {
    r.value(COOLANT_TEMP) >= 105.0 && r.value(THROTTLE_POSITION) >= 90.0
}

fn system_voltage_low(r: &ReadingSet) -> bool {
    r.value(BATTERY_VOLTAGE) < 11.8
}

const ENGINE_DTCS: [DtcSpec; 5] = [
    DtcSpec::new(
        "P0128",
        "Coolant Temperature Below Thermostat Regulating Temperature",
        coolant_below_thermostat,
    ),
    DtcSpec::new("P0522", "Engine Oil Pressure Too Low", oil_pressure_low),
    DtcSpec::new(
        "P2101",
        "Throttle Actuator Control Motor Circuit Range/Performance",
        throttle_out_of_range,
    ),
    DtcSpec::new(OVERHEAT_CODE, "Engine Coolant Over Temperature Condition", coolant_over_temperature),
    DtcSpec::new("P0562", "System Voltage Low", system_voltage_low),
];

#[derive(Debug, Clone)]
pub struct DtcCatalog {
    specs: Vec<DtcSpec>,
}

impl DtcCatalog {
    pub fn new(specs: Vec<DtcSpec>) -> Result<Self, CatalogError> {
        for (index, spec) in specs.iter().enumerate() {
            if specs[..index].iter().any(|s| s.code == spec.code) {
                return Err(CatalogError::DuplicateDtc(spec.code.to_string()));
            }
        }
        Ok(Self { specs })
    }

    pub fn engine() -> Self {
        Self { specs: ENGINE_DTCS.to_vec() }
    }

    pub fn specs(&self) -> &[DtcSpec] {
        &self.specs
    }

    pub fn contains(&self, code: &str) -> bool {
        self.specs.iter().any(|s| s.code == code)
    }

    pub fn describe(&self, code: &str) -> Option<&'static str> {
        self.specs.iter().find(|s| s.code == code).map(|s| s.description)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for DtcCatalog {
    fn default() -> Self {
        Self::engine()
    }
}

/// Codes active for one reading set, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActiveDtcSet {
    codes: Vec<&'static str>,
}

impl ActiveDtcSet {
    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| *c == code)
    }

    pub fn codes(&self) -> &[&'static str] {
        &self.codes
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.codes.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Evaluate every trigger in `catalog` against `readings`.
pub fn evaluate(readings: &ReadingSet, catalog: &DtcCatalog) -> ActiveDtcSet {
    let codes = catalog
        .specs()
        .iter()
        .filter(|spec| spec.is_triggered(readings))
        .map(|spec| spec.code)
        .collect();
    ActiveDtcSet { codes }
}
