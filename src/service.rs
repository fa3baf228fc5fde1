//! Periodic tick loop and TCP query server.

use crate::engine::{EngineSimulator, ReadingSource};
use crate::error::EngineError;
use crate::persist;
use crate::protocol::ProtocolHandler;
use crate::telemetry::{TelemetryPublisher, TelemetryReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct TickLoopOptions {
    pub period: Duration,
    pub halt_on_error: bool,
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickLoopStats {
    pub ticks_completed: u64,
    pub ticks_failed: u64,
}

/// Drive `simulator` every `options.period` until `shutdown` flips to true.
///
/// The simulator is moved into this task, so ticks never overlap. Each
/// successful tick is published as a whole snapshot.
pub async fn run_tick_loop<S>(
    mut simulator: EngineSimulator<S>,
    publisher: TelemetryPublisher,
    options: TickLoopOptions,
    mut shutdown: watch::Receiver<bool>,
) -> Result<TickLoopStats, EngineError>
where
    S: ReadingSource,
{
    let mut interval = time::interval(options.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut stats = TickLoopStats::default();

    info!(period_ms = options.period.as_millis() as u64, "tick loop started");

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = interval.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        match simulator.tick() {
            Ok(snapshot) => {
                stats.ticks_completed += 1;
                if let Some(path) = &options.snapshot_path {
                    let target = path.clone();
                    let record = Arc::clone(&snapshot);
                    match task::spawn_blocking(move || persist::save(&target, &record)).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => warn!(path = %path.display(), error = %e, "failed to persist snapshot"),
                        Err(e) => warn!(path = %path.display(), error = %e, "snapshot writer task failed"),
                    }
                }
                publisher.publish(snapshot);
            }
            Err(e) => {
                stats.ticks_failed += 1;
                error!(error = %e, tick = simulator.tick_count() + 1, "tick failed");
                if options.halt_on_error {
                    return Err(e);
                }
            }
        }
    }

    info!(
        completed = stats.ticks_completed,
        failed = stats.ticks_failed,
        "tick loop stopped"
    );
    Ok(stats)
}

/// Accept query clients on `listener` until `shutdown` flips to true.
pub async fn serve(
    listener: TcpListener,
    reader: TelemetryReader,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let handler = ProtocolHandler::new(reader);
    info!(addr = %listener.local_addr()?, "query server listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    info!(%addr, "client connected");
                    let client_handler = handler.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, client_handler).await {
                            warn!(%addr, error = %e, "client error");
                        }
                        info!(%addr, "client disconnected");
                    });
                }
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                }
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("query server stopped");
    Ok(())
}

async fn handle_client(stream: TcpStream, handler: ProtocolHandler) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handler.handle_line(&line);
        let out = match response.to_line() {
            Ok(out) => out,
            Err(e) => {
                error!(error = %e, "failed to encode response");
                continue;
            }
        };
        writer.write_all(out.as_bytes()).await?;
        debug!(response = out.trim_end(), "sent response");
    }

    Ok(())
}
