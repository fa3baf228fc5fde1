//! Line-delimited JSON query protocol.
//!
//! A client writes one [`Request`] per line and reads back one
//! [`Response`] per line. Requests only read the published snapshot.

use crate::engine::EngineState;
use crate::error::ProtocolError;
use crate::telemetry::TelemetryReader;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const MAX_REQUEST_LINE: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Query {
    GetEngineFrame,
    GetEngineState,
    GetActiveDtcs,
    GetSnapshot,
}

impl Query {
    pub const fn name(self) -> &'static str {
        match self {
            Query::GetEngineFrame => "GetEngineFrame",
            Query::GetEngineState => "GetEngineState",
            Query::GetActiveDtcs => "GetActiveDtcs",
            Query::GetSnapshot => "GetSnapshot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: u32,
    pub query: Query,
}

impl Request {
    pub fn new(id: u32, query: Query) -> Self {
        Self { id, query }
    }

    pub fn to_line(&self) -> Result<String, ProtocolError> {
        let mut line = serde_json::to_string(self).map_err(ProtocolError::Serialize)?;
        line.push('\n');
        Ok(line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Frame { hex: String },
    State { state: EngineState },
    Dtcs { codes: Vec<String> },
    Snapshot {
        tick: u64,
        state: EngineState,
        frame: String,
        dtcs: Vec<String>,
    },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u32,
    pub status: ResponseStatus,
    pub payload: Payload,
}

impl Response {
    pub fn success(id: u32, payload: Payload) -> Self {
        Self { id, status: ResponseStatus::Success, payload }
    }

    pub fn error(id: u32, message: impl Into<String>) -> Self {
        Self {
            id,
            status: ResponseStatus::Error,
            payload: Payload::Error { message: message.into() },
        }
    }

    pub fn to_line(&self) -> Result<String, ProtocolError> {
        let mut line = serde_json::to_string(self).map_err(ProtocolError::Serialize)?;
        line.push('\n');
        Ok(line)
    }
}

pub fn parse_request(line: &str) -> Result<Request, ProtocolError> {
    serde_json::from_str(line.trim()).map_err(ProtocolError::Parse)
}

/// Answers queries from the latest published snapshot.
#[derive(Debug, Clone)]
pub struct ProtocolHandler {
    reader: TelemetryReader,
}

impl ProtocolHandler {
    pub fn new(reader: TelemetryReader) -> Self {
        Self { reader }
    }

    pub fn handle(&self, request: &Request) -> Response {
        let payload = match request.query {
            Query::GetEngineFrame => Payload::Frame { hex: self.reader.get_engine_frame() },
            Query::GetEngineState => Payload::State { state: self.reader.snapshot().state },
            Query::GetActiveDtcs => Payload::Dtcs { codes: self.reader.get_active_dtcs() },
            Query::GetSnapshot => {
                // one borrow so all fields come from the same tick
                let snapshot = self.reader.snapshot();
                Payload::Snapshot {
                    tick: snapshot.tick,
                    state: snapshot.state,
                    frame: snapshot.frame.to_hex().to_string(),
                    dtcs: snapshot.active_dtcs.to_strings(),
                }
            }
        };
        debug!(id = request.id, query = request.query.name(), "query handled");
        Response::success(request.id, payload)
    }

    /// Parse and answer one request line. Malformed lines get an error with id 0.
    pub fn handle_line(&self, line: &str) -> Response {
        if line.len() > MAX_REQUEST_LINE {
            warn!(len = line.len(), "request line too long");
            return Response::error(0, format!("request exceeds {MAX_REQUEST_LINE} bytes"));
        }
        match parse_request(line) {
            Ok(request) => self.handle(&request),
            Err(e) => {
                warn!(error = %e, "rejecting malformed request");
                Response::error(0, e.to_string())
            }
        }
    }
}
