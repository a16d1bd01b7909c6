//! CAN Trace Analyzer CLI Application
//!
//! Command-line interface for the can-trace-analyzer library. It adds:
//! - Argument parsing and an optional TOML configuration file
//! - Text and JSON report rendering
//! - The targeted packet listing with decoded signals

use anyhow::{bail, Context, Result};
use can_trace_analyzer::{parse_can_id, Analyzer, DbcSignalDecoder, PacketMatch};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;

mod config;
mod report;

use config::{AppConfig, OutputFormat};

/// CAN Trace Analyzer - message rates, jitter and bus load of CAN traces
#[derive(Parser, Debug)]
#[command(name = "can-trace")]
#[command(about = "Analyze CAN bus traces (.trc, candump .log/.asc, Vector .asc)", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the trace file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Target CAN ID (hex, e.g. 1F4 or 0x1F4) whose packets are listed
    #[arg(long = "id", value_name = "HEX")]
    target_id: Option<String>,

    /// CAN bus bit rate in Mbps [default: 1.0]
    #[arg(short = 'b', long = "bit-rate", value_name = "MBPS")]
    bit_rate: Option<f64>,

    /// Path to a DBC file for decoding the targeted packets
    #[arg(long, value_name = "FILE")]
    dbc: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report format [default: txt]
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::debug!("CAN Trace CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using analyzer library v{}", can_trace_analyzer::VERSION);

    let config = resolve_config(&args)?;

    // Validate the target before touching the trace
    let target = match &args.target_id {
        Some(text) => match parse_can_id(text) {
            Some(id) => Some((text.as_str(), id)),
            None => bail!("Invalid CAN ID '{}': expected a hexadecimal identifier", text),
        },
        None => None,
    };

    let mut analyzer = Analyzer::new(config.analysis.clone());
    if let Some(dbc_path) = &config.signals.dbc {
        let decoder = DbcSignalDecoder::from_dbc_file(dbc_path)
            .with_context(|| format!("Failed to load DBC file {:?}", dbc_path))?;
        let stats = decoder.database_stats();
        log::info!(
            "Signal database: {} messages, {} signals",
            stats.num_messages,
            stats.num_signals
        );
        analyzer = analyzer.with_signal_decoder(Box::new(decoder));
    }

    let analysis = analyzer
        .analyze_file(&args.file)
        .with_context(|| format!("Failed to analyze {:?}", args.file))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match config.output.format {
        OutputFormat::Txt => {
            report::write_text_summary(&mut out, &analysis, analyzer.signal_decoder())?;

            if let Some((label, can_id)) = target {
                if !analysis.is_empty() {
                    let packets = analyzer.filter_file(&args.file, analysis.dialect, can_id)?;
                    let count = report::write_text_packets(&mut out, label, packets)?;
                    log::debug!("Listed {} packets for 0x{:X}", count, can_id);
                }
            }
        }
        OutputFormat::Json => {
            let packets = match target {
                Some((_, can_id)) => Some(
                    analyzer
                        .filter_file(&args.file, analysis.dialect, can_id)?
                        .collect::<can_trace_analyzer::Result<Vec<PacketMatch>>>()?,
                ),
                None => None,
            };
            let json = report::json_report(
                &args.file,
                &analysis,
                analyzer.signal_decoder(),
                packets.as_deref(),
            );
            report::write_json(&mut out, &json)?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Merge the configuration file (if any) with command-line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(rate) = args.bit_rate {
        if !(rate > 0.0) {
            bail!("Invalid bit rate {} Mbps: must be positive", rate);
        }
        config.analysis.bus_rate_mbps = rate;
    }
    if let Some(dbc) = &args.dbc {
        config.signals.dbc = Some(dbc.clone());
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }

    Ok(config)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
