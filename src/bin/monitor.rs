use clap::{App, Arg};
use colored::*;
use ecusim::client::{QueryClient, DEFAULT_CONNECT_ATTEMPTS, DEFAULT_RETRY_DELAY};
use ecusim::codec::FrameCodec;
use ecusim::config::EcuConfig;
use ecusim::dtc::DtcCatalog;
use ecusim::engine::EngineState;
use ecusim::validation::{display_name, SignalReport, WarningThresholds};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "7100";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let matches = App::new("ecu-monitor")
        .version("0.1.0")
        .author("Powertrain Systems Engineering Team")
        .about("Decodes the ECU simulator's engine frame and flags out-of-range values")
        .arg(
            Arg::with_name("host")
                .short("H")
                .long("host")
                .value_name("HOST")
                .help("Simulator host address")
                .takes_value(true)
                .default_value(DEFAULT_HOST),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Simulator query port")
                .takes_value(true)
                .default_value(DEFAULT_PORT),
        )
        .arg(
            Arg::with_name("interval")
                .short("i")
                .long("interval")
                .value_name("MS")
                .help("Polling interval in milliseconds")
                .takes_value(true)
                .default_value("1000"),
        )
        .arg(
            Arg::with_name("count")
                .short("n")
                .long("count")
                .value_name("N")
                .help("Stop after N polls (default: run until interrupted)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Read warning thresholds from the simulator's JSON config")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["table", "json", "compact"])
                .default_value("table"),
        )
        .get_matches();

    let host = matches.value_of("host").unwrap_or(DEFAULT_HOST);
    let port = matches.value_of("port").unwrap_or(DEFAULT_PORT).parse::<u16>()?;
    let interval = Duration::from_millis(matches.value_of("interval").unwrap_or("1000").parse()?);
    let count = matches.value_of("count").map(str::parse::<u64>).transpose()?;
    let format = matches.value_of("format").unwrap_or("table");

    let addr = format!("{host}:{port}");
    println!("{} {}", "Connecting to ECU simulator at".dimmed(), addr.bright_white());
    let mut client = QueryClient::connect_with_retry(&addr, DEFAULT_CONNECT_ATTEMPTS, DEFAULT_RETRY_DELAY).await?;
    println!("{} {}", "✅".green(), "Connected to ECU simulator".bright_green());

    let codec = FrameCodec::default();
    let dtcs = DtcCatalog::engine();
    let thresholds = match matches.value_of("config") {
        Some(path) => EcuConfig::load(Path::new(path))?.thresholds,
        None => WarningThresholds::default(),
    };
    let mut polls = 0u64;

    loop {
        // Poll errors are reported and retried on the next cycle
        match poll(&mut client, &codec, &thresholds).await {
            Ok((state, hex_frame, codes, reports)) => match format {
                "json" => print_json(state, &hex_frame, &codes, &reports),
                "compact" => print_compact(state, &codes, &reports),
                _ => print_table(state, &hex_frame, &codes, &reports, &dtcs),
            },
            Err(e) => eprintln!("{} {}", "❌ Error during operation:".red(), e.to_string().bright_red()),
        }

        polls += 1;
        if count.is_some_and(|limit| polls >= limit) {
            break;
        }
        tokio::time::sleep(interval).await;
    }

    Ok(())
}

async fn poll(
    client: &mut QueryClient,
    codec: &FrameCodec,
    thresholds: &WarningThresholds,
) -> Result<(EngineState, String, Vec<String>, Vec<SignalReport>), Box<dyn std::error::Error>> {
    let snapshot = client.get_snapshot().await?;
    let reports = thresholds.inspect_hex(codec, &snapshot.frame)?;
    Ok((snapshot.state, snapshot.frame, snapshot.dtcs, reports))
}

fn colored_state(state: EngineState) -> ColoredString {
    match state {
        EngineState::Running => state.as_str().bright_green(),
        EngineState::Cranking => state.as_str().bright_yellow(),
        EngineState::Fault => state.as_str().bright_red().bold(),
        EngineState::Off | EngineState::Shutdown => state.as_str().dimmed(),
    }
}

fn print_table(state: EngineState, hex_frame: &str, codes: &[String], reports: &[SignalReport], dtcs: &DtcCatalog) {
    println!();
    println!("{}", "=== Decoded Engine Data ===".bright_blue().bold());
    println!("{} {}", "State:".bright_white(), colored_state(state));
    println!("{} {}", "Frame:".bright_white(), hex_frame.cyan());
    println!("{:<20}{:<10}{:<10}{:<10}", "Parameter", "Value", "Unit", "Status");
    println!("{}", "-".repeat(50));
    for report in reports {
        let status = match report.warning {
            Some(warning) => format!("⚠️  {warning}").yellow(),
            None => "".normal(),
        };
        println!(
            "{:<20}{:<10}{:<10}{}",
            display_name(&report.name),
            report.value,
            report.unit,
            status
        );
    }
    if codes.is_empty() {
        println!("{} {}", "DTCs:".bright_white(), "none".green());
    } else {
        println!("{}", "DTCs:".bright_white());
        for code in codes {
            let description = dtcs.describe(code).unwrap_or("Unknown code");
            println!("  {} {}", code.bright_red(), description);
        }
    }
}

fn print_compact(state: EngineState, codes: &[String], reports: &[SignalReport]) {
    let warnings = reports.iter().filter(|r| r.warning.is_some()).count();
    println!(
        "{} dtcs=[{}] warnings={}",
        colored_state(state),
        codes.join(","),
        if warnings == 0 { warnings.to_string().green() } else { warnings.to_string().yellow() }
    );
}

fn print_json(state: EngineState, hex_frame: &str, codes: &[String], reports: &[SignalReport]) {
    let line = json!({
        "state": state,
        "frame": hex_frame,
        "dtcs": codes,
        "signals": reports,
    });
    println!("{line}");
}
