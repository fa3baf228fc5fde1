//! Signal catalog: the static layout of the engine frame.
//!
//! Each [`SignalSpec`] places one physical quantity into the frame at a
//! byte-aligned position with a linear `raw * scale + offset` transform.
//! A [`SignalCatalog`] is validated once when it is built, so the codec can
//! rely on non-overlapping, byte-aligned, 8 or 16 bit signals.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

/// CAN FD payload limit.
pub const MAX_FRAME_LEN: usize = 64;

/// Arbitration ID the default engine frame is broadcast under.
pub const ENGINE_FRAME_ID: u32 = 0x100;

const_assert!(MAX_FRAME_LEN % 8 == 0);
const_assert!(MAX_FRAME_LEN <= 64);

pub const RPM: &str = "rpm";
pub const SPEED: &str = "speed";
pub const COOLANT_TEMP: &str = "coolant_temp";
pub const OIL_PRESSURE: &str = "oil_pressure";
pub const THROTTLE_POSITION: &str = "throttle_position";
pub const FUEL_LEVEL: &str = "fuel_level";
pub const BATTERY_VOLTAGE: &str = "battery_voltage";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSpec {
    pub name: String,
    pub start_bit: u16,
    pub bit_length: u8,
    pub scale: f64,
    pub offset: f64,
    pub unit: String,
}

impl SignalSpec {
    pub fn new(name: &str, start_bit: u16, bit_length: u8, scale: f64, offset: f64, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            start_bit,
            bit_length,
            scale,
            offset,
            unit: unit.to_string(),
        }
    }

    /// Index of the first byte this signal occupies.
    pub fn byte_index(&self) -> usize {
        usize::from(self.start_bit / 8)
    }

    /// One past the last bit this signal occupies.
    pub fn end_bit(&self) -> usize {
        usize::from(self.start_bit) + usize::from(self.bit_length)
    }

    fn byte_range(&self) -> core::ops::Range<usize> {
        let start = self.byte_index();
        start..start + usize::from(self.bit_length).div_ceil(8)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalCatalog {
    signals: Vec<SignalSpec>,
    frame_len: usize,
}

impl SignalCatalog {
    /// Validate a signal layout and compute its frame length.
    pub fn new(signals: Vec<SignalSpec>) -> Result<Self, CatalogError> {
        if signals.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }

        for (index, signal) in signals.iter().enumerate() {
            if !matches!(signal.bit_length, 8 | 16) {
                return Err(CatalogError::UnsupportedBitWidth {
                    signal: signal.name.clone(),
                    bit_length: signal.bit_length,
                });
            }
            if signal.start_bit % 8 != 0 {
                return Err(CatalogError::MisalignedSignal {
                    signal: signal.name.clone(),
                    start_bit: signal.start_bit,
                });
            }
            if signal.scale == 0.0 || !signal.scale.is_finite() || !signal.offset.is_finite() {
                return Err(CatalogError::InvalidScale {
                    signal: signal.name.clone(),
                    scale: signal.scale,
                });
            }
            if signals[..index].iter().any(|s| s.name == signal.name) {
                return Err(CatalogError::DuplicateSignal(signal.name.clone()));
            }
        }

        let mut by_position: Vec<&SignalSpec> = signals.iter().collect();
        by_position.sort_by_key(|s| s.start_bit);
        for pair in by_position.windows(2) {
            if pair[0].byte_range().end > pair[1].byte_range().start {
                return Err(CatalogError::OverlappingSignals {
                    first: pair[0].name.clone(),
                    second: pair[1].name.clone(),
                });
            }
        }

        let max_end_bit = signals.iter().map(SignalSpec::end_bit).max().unwrap_or(0);
        let frame_len = max_end_bit.div_ceil(8);
        if frame_len > MAX_FRAME_LEN {
            return Err(CatalogError::FrameTooLong {
                required: frame_len,
                limit: MAX_FRAME_LEN,
            });
        }

        Ok(Self { signals, frame_len })
    }

    /// The engine frame layout broadcast on ID 0x100.
    pub fn engine() -> Self {
        let signals = vec![
            SignalSpec::new(RPM, 0, 16, 1.0, 0.0, "rpm"),
            SignalSpec::new(SPEED, 16, 8, 1.0, 0.0, "km/h"),
            SignalSpec::new(COOLANT_TEMP, 24, 8, 1.0, -40.0, "°C"),
            SignalSpec::new(OIL_PRESSURE, 32, 8, 0.1, 0.0, "bar"),
            SignalSpec::new(THROTTLE_POSITION, 40, 8, 0.5, 0.0, "%"),
            SignalSpec::new(FUEL_LEVEL, 48, 8, 0.5, 0.0, "%"),
            SignalSpec::new(BATTERY_VOLTAGE, 56, 8, 0.1, 0.0, "V"),
        ];
        Self::new(signals).expect("engine layout is byte aligned, non-overlapping and fits one frame")
    }

    /// Frame length in bytes, derived from the furthest signal end.
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn signals(&self) -> &[SignalSpec] {
        &self.signals
    }

    pub fn get(&self, name: &str) -> Option<&SignalSpec> {
        self.signals.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

impl Default for SignalCatalog {
    fn default() -> Self {
        Self::engine()
    }
}
