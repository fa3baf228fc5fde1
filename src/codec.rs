//! Frame codec.
//!
//! Packs a [`ReadingSet`] into the byte layout described by a
//! [`SignalCatalog`] and back. Signals are little-endian (Intel) and
//! byte aligned. The physical to raw conversion is
//! `raw = round((value - offset) / scale)`; raw values are masked to the
//! declared width without saturation, so out-of-range values wrap.

use crate::error::CodecError;
use crate::readings::{round1, ReadingSet};
use crate::signals::{SignalCatalog, SignalSpec, MAX_FRAME_LEN};
use arrayvec::ArrayString;
use core::fmt::Write as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

pub type FrameBytes = heapless::Vec<u8, MAX_FRAME_LEN>;
pub type HexFrame = ArrayString<{ MAX_FRAME_LEN * 2 }>;

/// One encoded engine frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    bytes: FrameBytes,
}

impl Frame {
    /// All-zero frame of `len` bytes, clamped to [`MAX_FRAME_LEN`].
    pub fn zeroed(len: usize) -> Self {
        let mut bytes = FrameBytes::new();
        // len is bounded by the catalog validation, the clamp only guards direct callers
        let _ = bytes.resize(len.min(MAX_FRAME_LEN), 0);
        Self { bytes }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CodecError> {
        FrameBytes::from_slice(bytes)
            .map(|bytes| Self { bytes })
            .map_err(|()| CodecError::FrameTooLong {
                len: bytes.len(),
                limit: MAX_FRAME_LEN,
            })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, CodecError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lower-case hex rendering.
    pub fn to_hex(&self) -> HexFrame {
        let mut out = HexFrame::new();
        for byte in &self.bytes {
            // capacity is exactly two characters per byte
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl core::fmt::Display for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Frame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Frame {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        Frame::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

/// Physical value to signed raw integer, before width masking.
pub fn to_raw(spec: &SignalSpec, value: f64) -> i64 {
    ((value - spec.offset) / spec.scale).round() as i64
}

/// Write one signal into `frame`.
pub fn pack_signal(frame: &mut [u8], spec: &SignalSpec, value: f64) -> Result<(), CodecError> {
    let idx = spec.byte_index();
    let raw = to_raw(spec, value);
    let actual = frame.len();
    match spec.bit_length {
        8 => {
            let slot = frame.get_mut(idx).ok_or(CodecError::FrameTooShort {
                required: idx + 1,
                actual,
            })?;
            *slot = (raw & 0xFF) as u8;
        }
        16 => {
            let slots = frame.get_mut(idx..idx + 2).ok_or(CodecError::FrameTooShort {
                required: idx + 2,
                actual,
            })?;
            slots[0] = (raw & 0xFF) as u8;
            slots[1] = ((raw >> 8) & 0xFF) as u8;
        }
        other => {
            return Err(CodecError::UnsupportedBitWidth {
                signal: spec.name.clone(),
                bit_length: other,
            })
        }
    }
    Ok(())
}

/// Read one signal out of `frame`, rounded to one decimal.
pub fn unpack_signal(frame: &[u8], spec: &SignalSpec) -> Result<f64, CodecError> {
    let idx = spec.byte_index();
    let raw: u16 = match spec.bit_length {
        8 => {
            let byte = frame.get(idx).ok_or(CodecError::FrameTooShort {
                required: idx + 1,
                actual: frame.len(),
            })?;
            u16::from(*byte)
        }
        16 => {
            let bytes = frame.get(idx..idx + 2).ok_or(CodecError::FrameTooShort {
                required: idx + 2,
                actual: frame.len(),
            })?;
            u16::from_le_bytes([bytes[0], bytes[1]])
        }
        other => {
            return Err(CodecError::UnsupportedBitWidth {
                signal: spec.name.clone(),
                bit_length: other,
            })
        }
    };
    Ok(round1(f64::from(raw) * spec.scale + spec.offset))
}

/// Encoder/decoder bound to one signal catalog.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    catalog: Arc<SignalCatalog>,
}

impl FrameCodec {
    pub fn new(catalog: Arc<SignalCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &SignalCatalog {
        &self.catalog
    }

    pub fn frame_len(&self) -> usize {
        self.catalog.frame_len()
    }

    /// Encode every catalog signal; absent readings encode as 0.
    pub fn encode(&self, readings: &ReadingSet) -> Result<Frame, CodecError> {
        let mut frame = Frame::zeroed(self.catalog.frame_len());
        for spec in self.catalog.signals() {
            pack_signal(&mut frame.bytes, spec, readings.value(&spec.name))?;
        }
        Ok(frame)
    }

    pub fn decode(&self, frame: &[u8]) -> Result<ReadingSet, CodecError> {
        let required = self.catalog.frame_len();
        if frame.len() < required {
            return Err(CodecError::FrameTooShort {
                required,
                actual: frame.len(),
            });
        }

        let mut readings = ReadingSet::new();
        for spec in self.catalog.signals() {
            readings.insert(&spec.name, unpack_signal(frame, spec)?);
        }
        Ok(readings)
    }

    pub fn encode_hex(&self, readings: &ReadingSet) -> Result<String, CodecError> {
        Ok(self.encode(readings)?.to_hex().to_string())
    }

    pub fn decode_hex(&self, hex_str: &str) -> Result<ReadingSet, CodecError> {
        let frame = Frame::from_hex(hex_str)?;
        self.decode(frame.as_bytes())
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(Arc::new(SignalCatalog::engine()))
    }
}
