use thiserror::Error;

/// Rejected signal or DTC catalog layouts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("signal '{signal}' declares unsupported bit width {bit_length} (expected 8 or 16)")]
    UnsupportedBitWidth { signal: String, bit_length: u8 },

    #[error("signal '{signal}' starts at bit {start_bit}, which is not byte aligned")]
    MisalignedSignal { signal: String, start_bit: u16 },

    #[error("signals '{first}' and '{second}' overlap")]
    OverlappingSignals { first: String, second: String },

    #[error("signal '{0}' is declared more than once")]
    DuplicateSignal(String),

    #[error("signal '{signal}' has invalid scale {scale}")]
    InvalidScale { signal: String, scale: f64 },

    #[error("frame layout needs {required} bytes, limit is {limit}")]
    FrameTooLong { required: usize, limit: usize },

    #[error("catalog declares no signals")]
    EmptyCatalog,

    #[error("DTC '{0}' is declared more than once")]
    DuplicateDtc(String),
}

/// Failures while packing or unpacking a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("signal '{signal}' declares unsupported bit width {bit_length}")]
    UnsupportedBitWidth { signal: String, bit_length: u8 },

    #[error("frame too short: need {required} bytes, got {actual}")]
    FrameTooShort { required: usize, actual: usize },

    #[error("invalid hex frame: {0}")]
    InvalidHex(String),

    #[error("frame of {len} bytes exceeds the {limit} byte limit")]
    FrameTooLong { len: usize, limit: usize },
}

/// A reading source could not produce values for this tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("reading source failed: {0}")]
pub struct SourceError(pub String);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to parse request: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to serialize message: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("snapshot i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not reach {addr} after {attempts} attempts")]
    ConnectFailed { addr: String, attempts: u32 },

    #[error("server closed the connection")]
    Disconnected,

    #[error("malformed response: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("server reported an error: {0}")]
    Remote(String),

    #[error("unexpected response payload for {0}")]
    UnexpectedPayload(&'static str),
}
