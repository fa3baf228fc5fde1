use clap::{App, Arg};
use ecusim::config::EcuConfig;
use ecusim::engine::EngineSimulator;
use ecusim::service::{self, TickLoopOptions};
use ecusim::telemetry::{self, EngineSnapshot};
use ecusim::persist;
use ecusim::signals::ENGINE_FRAME_ID;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = App::new("ecusim")
        .version("0.1.0")
        .author("Powertrain Systems Engineering Team")
        .about("Engine ECU simulator - publishes a CAN-style engine frame, lifecycle state and DTCs")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("bind")
                .short("b")
                .long("bind")
                .value_name("ADDR")
                .help("Query server listen address")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("period")
                .long("period")
                .value_name("MS")
                .help("Tick period in milliseconds")
                .takes_value(true)
                .validator(|v| match v.parse::<u64>() {
                    Ok(ms) if ms > 0 => Ok(()),
                    _ => Err("Period must be a positive number of milliseconds".into()),
                }),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .value_name("SEED")
                .help("Seed the reading generator for reproducible runs")
                .takes_value(true)
                .validator(|v| match v.parse::<u64>() {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Seed must be an unsigned integer".into()),
                }),
        )
        .arg(
            Arg::with_name("snapshot")
                .long("snapshot")
                .value_name("FILE")
                .help("Persist the last good snapshot to this file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("fault-code")
                .long("fault-code")
                .value_name("DTC")
                .help("DTC that moves a running engine into FAULT")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("skip-failed-ticks")
                .long("skip-failed-ticks")
                .help("Keep running when a tick fails instead of stopping"),
        )
        .get_matches();

    let mut config = match matches.value_of("config") {
        Some(path) => EcuConfig::load(Path::new(path))?,
        None => EcuConfig::default(),
    };
    if let Some(bind) = matches.value_of("bind") {
        config.service.bind_addr = bind.to_string();
    }
    if let Some(period) = matches.value_of("period") {
        config.simulator.tick_period_ms = period.parse()?;
    }
    if let Some(seed) = matches.value_of("seed") {
        config.simulator.seed = Some(seed.parse()?);
    }
    if let Some(path) = matches.value_of("snapshot") {
        config.service.snapshot_path = Some(PathBuf::from(path));
    }
    if let Some(code) = matches.value_of("fault-code") {
        config.simulator.fault_trigger_code = code.to_string();
    }
    if matches.is_present("skip-failed-ticks") {
        config.service.halt_on_error = false;
    }

    if let Some(path) = &config.service.snapshot_path {
        match persist::load(path) {
            Ok(Some(previous)) => info!(
                tick = previous.tick,
                state = %previous.state,
                frame = %previous.frame_hex(),
                dtcs = ?previous.active_dtcs,
                "last known good snapshot"
            ),
            Ok(None) => info!(path = %path.display(), "no previous snapshot"),
            Err(e) => warn!(path = %path.display(), error = %e, "ignoring unreadable snapshot"),
        }
    }

    let simulator = EngineSimulator::new(&config.simulator);
    let initial = EngineSnapshot::initial(simulator.codec(), simulator.dtc_catalog())?;
    let (publisher, reader) = telemetry::channel(initial);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener = TcpListener::bind(&config.service.bind_addr).await?;
    let server = tokio::spawn(service::serve(listener, reader, shutdown_rx.clone()));

    let options = TickLoopOptions {
        period: config.simulator.tick_period(),
        halt_on_error: config.service.halt_on_error,
        snapshot_path: config.service.snapshot_path.clone(),
    };
    let mut tick_loop = tokio::spawn(service::run_tick_loop(simulator, publisher, options, shutdown_rx));

    info!(
        bind = %config.service.bind_addr,
        period_ms = config.simulator.tick_period_ms,
        fault_code = %config.simulator.fault_trigger_code,
        frame_id = %format!("{ENGINE_FRAME_ID:#05x}"),
        "ECU simulator started"
    );

    let finished = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
            None
        }
        result = &mut tick_loop => Some(result),
    };
    let _ = shutdown_tx.send(true);
    let loop_result = match finished {
        Some(result) => result,
        None => tick_loop.await,
    };

    if let Err(e) = server.await? {
        error!(error = %e, "query server failed");
    }

    match loop_result? {
        Ok(stats) => {
            info!(ticks = stats.ticks_completed, "ECU simulator stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "ECU simulator halted");
            Err(e.into())
        }
    }
}
