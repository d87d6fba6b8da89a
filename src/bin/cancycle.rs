use clap::{App, Arg};
use colored::*;
use std::time::Duration;
use tokio::time;
use tracing::{error, info};

use cancycle::{Bitrate, CanFrame, EngineConfig, FrameLog, MockDriver, Session};

const DEFAULT_REFRESH_MS: u64 = 1000;
const SIM_NODE_ID: u16 = 0x7FF;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let matches = App::new("cancycle")
        .version("0.1.0")
        .author("Vehicle Network Tools Team")
        .about("🚌 Cyclic CAN-bus transceiver - periodic transmit with a live receive log")
        .arg(
            Arg::with_name("channel")
                .short("c")
                .long("channel")
                .value_name("INDEX")
                .help("Adapter channel index")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("bitrate")
                .short("b")
                .long("bitrate")
                .value_name("RATE")
                .help("Bus bitrate")
                .takes_value(true)
                .possible_values(&["1m", "500k", "250k", "125k", "100k"]),
        )
        .arg(
            Arg::with_name("period")
                .short("p")
                .long("period")
                .value_name("MS")
                .help("Transmit period in milliseconds")
                .takes_value(true)
                .validator(validate_nonzero_u64),
        )
        .arg(
            Arg::with_name("capacity")
                .long("capacity")
                .value_name("N")
                .help("Receive log capacity")
                .takes_value(true)
                .validator(validate_nonzero_u64),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file (flags override it)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Final stats output format")
                .takes_value(true)
                .possible_values(&["table", "json"])
                .default_value("table"),
        )
        .arg(
            Arg::with_name("rows")
                .long("rows")
                .value_name("N")
                .help("Log rows shown per refresh")
                .takes_value(true)
                .default_value("10")
                .validator(validate_nonzero_u64),
        )
        .arg(
            Arg::with_name("sim-period")
                .long("sim-period")
                .value_name("MS")
                .help("Simulated remote node transmit period (0 disables)")
                .takes_value(true)
                .default_value("25"),
        )
        .get_matches();

    let mut config = match matches.value_of("config") {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    if let Some(channel) = matches.value_of("channel") {
        config.channel = channel.parse()?;
    }
    if let Some(bitrate) = matches.value_of("bitrate") {
        config.bitrate = parse_bitrate(bitrate);
    }
    if let Some(period) = matches.value_of("period") {
        config.tx_period_ms = period.parse()?;
    }
    if let Some(capacity) = matches.value_of("capacity") {
        config.log_capacity = capacity.parse()?;
    }
    let rows: usize = matches.value_of("rows").unwrap_or("10").parse()?;
    let sim_period_ms: u64 = matches.value_of("sim-period").unwrap_or("25").parse()?;
    let json_output = matches.value_of("format") == Some("json");

    println!("🚌 {}", "Cyclic CAN-Bus Transceiver".bold());
    println!("   Channel:  {}", config.channel);
    println!("   Bitrate:  {} bit/s", config.bitrate.bits_per_sec());
    println!("   Period:   {} ms", config.tx_period_ms);
    println!("   Log size: {} entries", config.log_capacity);

    // The demo runs against the in-memory adapter; real hardware binds the
    // same Session to its own CanDriver implementation.
    let driver = MockDriver::new();
    let mut session = Session::new(driver.clone(), config)?;

    if let Err(e) = session.start() {
        error!("start failed: {}", e);
        println!("{} {}", "✗".red().bold(), e.to_string().red());
        return Err(e.into());
    }
    println!("{} {}", "✓".green().bold(), "Connected & Running".green());

    // Simulated remote node so the receive path has traffic to show.
    let feeder = (sim_period_ms > 0).then(|| {
        let node = driver.clone();
        tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_millis(sim_period_ms));
            let mut seq: u8 = 0;
            loop {
                interval.tick().await;
                node.inject_frame(CanFrame::new(SIM_NODE_ID, &[0xAB, 0xCD, seq]));
                seq = seq.wrapping_add(1);
            }
        })
    });

    let log = session.log();
    let mut refresh = time::interval(Duration::from_millis(DEFAULT_REFRESH_MS));
    refresh.tick().await; // first tick completes immediately

    loop {
        tokio::select! {
            _ = refresh.tick() => print_view(&log, &session, rows),
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    if let Some(task) = feeder {
        task.abort();
    }
    session.stop();
    println!("{}", "Stopped".yellow());

    let stats = session.stats();
    if json_output {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("📊 {}", "Session stats".bold());
        println!("   Ticks fired:     {}", stats.ticks);
        println!("   Frames sent:     {}", stats.frames_sent);
        println!("   TX errors:       {}", stats.tx_errors);
        println!("   Frames received: {}", stats.frames_received);
        println!("   Entries evicted: {}", stats.entries_evicted);
    }

    Ok(())
}

fn print_view(log: &FrameLog, session: &Session<MockDriver>, rows: usize) {
    let stats = session.stats();
    println!(
        "\n{} sent {} | received {} | logged {}/{}",
        "▸".cyan(),
        stats.frames_sent,
        stats.frames_received,
        log.len(),
        log.capacity()
    );
    println!("{}", "  TIMESTAMP       ID  DLC  DATA".bold());
    for entry in log.snapshot().into_iter().take(rows) {
        println!("  {entry}");
    }
}

fn parse_bitrate(value: &str) -> Bitrate {
    match value {
        "1m" => Bitrate::Rate1M,
        "250k" => Bitrate::Rate250K,
        "125k" => Bitrate::Rate125K,
        "100k" => Bitrate::Rate100K,
        _ => Bitrate::Rate500K,
    }
}

fn validate_nonzero_u64(value: String) -> Result<(), String> {
    match value.parse::<u64>() {
        Ok(0) => Err("value must be greater than zero".into()),
        Ok(_) => Ok(()),
        Err(_) => Err("value must be a number".into()),
    }
}
