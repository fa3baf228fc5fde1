//! Query client for the simulator's TCP surface.

use crate::engine::EngineState;
use crate::error::ClientError;
use crate::protocol::{Payload, Query, Request, Response, ResponseStatus};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{info, warn};

pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 10;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Frame, state and codes of one published tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSnapshot {
    pub tick: u64,
    pub state: EngineState,
    pub frame: String,
    pub dtcs: Vec<String>,
}

pub struct QueryClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    next_id: u32,
}

impl QueryClient {
    pub async fn connect(addr: &str) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
            next_id: 1,
        })
    }

    /// Connect, retrying up to `attempts` times with `delay` between tries.
    pub async fn connect_with_retry(addr: &str, attempts: u32, delay: Duration) -> Result<Self, ClientError> {
        for attempt in 1..=attempts {
            match Self::connect(addr).await {
                Ok(client) => {
                    info!(addr, attempt, "connected to ECU simulator");
                    return Ok(client);
                }
                Err(e) => {
                    warn!(addr, attempt, error = %e, "connection attempt failed");
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        Err(ClientError::ConnectFailed {
            addr: addr.to_string(),
            attempts,
        })
    }

    /// Send one query and wait for its response.
    pub async fn query(&mut self, query: Query) -> Result<Response, ClientError> {
        let request = Request::new(self.next_id, query);
        self.next_id = self.next_id.wrapping_add(1);

        let line = request
            .to_line()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(line.as_bytes()).await?;

        let reply = tokio::time::timeout(RESPONSE_TIMEOUT, self.lines.next_line())
            .await
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "response timed out"))??
            .ok_or(ClientError::Disconnected)?;
        let response: Response = serde_json::from_str(&reply).map_err(ClientError::Malformed)?;

        if response.status == ResponseStatus::Error {
            let message = match response.payload {
                Payload::Error { message } => message,
                other => format!("{other:?}"),
            };
            return Err(ClientError::Remote(message));
        }
        Ok(response)
    }

    pub async fn get_engine_frame(&mut self) -> Result<String, ClientError> {
        match self.query(Query::GetEngineFrame).await?.payload {
            Payload::Frame { hex } => Ok(hex),
            _ => Err(ClientError::UnexpectedPayload(Query::GetEngineFrame.name())),
        }
    }

    pub async fn get_engine_state(&mut self) -> Result<EngineState, ClientError> {
        match self.query(Query::GetEngineState).await?.payload {
            Payload::State { state } => Ok(state),
            _ => Err(ClientError::UnexpectedPayload(Query::GetEngineState.name())),
        }
    }

    pub async fn get_active_dtcs(&mut self) -> Result<Vec<String>, ClientError> {
        match self.query(Query::GetActiveDtcs).await?.payload {
            Payload::Dtcs { codes } => Ok(codes),
            _ => Err(ClientError::UnexpectedPayload(Query::GetActiveDtcs.name())),
        }
    }

    /// Frame, state and codes in one round trip, all from the same tick.
    pub async fn get_snapshot(&mut self) -> Result<RemoteSnapshot, ClientError> {
        match self.query(Query::GetSnapshot).await?.payload {
            Payload::Snapshot { tick, state, frame, dtcs } => Ok(RemoteSnapshot { tick, state, frame, dtcs }),
            _ => Err(ClientError::UnexpectedPayload(Query::GetSnapshot.name())),
        }
    }
}
