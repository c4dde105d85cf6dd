//! Gridsense CLI - aggregate telemetry batches from files or stdin
//!
//! Commands:
//! - aggregate: bucket a record batch at a timeframe
//! - report: build the full dashboard report
//! - status: print the device liveness judgment
//! - doctor: diagnose engine configuration and input wiring

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use gridsense::normalizer::{Normalizer, RawReading};
use gridsense::{
    aggregate_records, EngineConfig, EngineError, EnergyProcessor, Timeframe, ENGINE_VERSION,
    PRODUCER_NAME,
};

/// Gridsense - aggregation engine for household electrical telemetry
#[derive(Parser)]
#[command(name = "gridsense")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Aggregate meter readings into buckets, metrics, and liveness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bucket a record batch at a timeframe
    Aggregate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "map")]
        input_format: InputFormat,

        /// Aggregation resolution (hour, day, week; 24h and month accepted)
        #[arg(short, long, default_value = "hour")]
        timeframe: String,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Build the full dashboard report
    Report {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "map")]
        input_format: InputFormat,

        /// Aggregation resolution
        #[arg(short, long, default_value = "hour")]
        timeframe: String,

        /// Tariff in currency units per kWh
        #[arg(long)]
        rate: Option<f64>,

        /// Monthly consumption goal in kWh
        #[arg(long)]
        goal: Option<f64>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Print the device liveness judgment
    Status {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "map")]
        input_format: InputFormat,
    },

    /// Diagnose engine configuration and input wiring
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON object mapping record ids to readings (the telemetry push shape)
    Map,
    /// Newline-delimited JSON, one reading per line
    Ndjson,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Aggregate {
            input,
            input_format,
            timeframe,
            pretty,
        } => {
            let timeframe: Timeframe = timeframe.parse()?;
            let records = read_records(&input, &input_format)?;
            let buckets = aggregate_records(&records, timeframe, Utc::now());
            print_json(&buckets, pretty)?;
            Ok(())
        }

        Commands::Report {
            input,
            input_format,
            timeframe,
            rate,
            goal,
            pretty,
        } => {
            let timeframe: Timeframe = timeframe.parse()?;
            let records = read_records(&input, &input_format)?;

            let mut config = EngineConfig::default();
            if let Some(rate) = rate {
                config.rate_per_kwh = rate;
            }
            config.monthly_goal_kwh = goal;

            let processor = EnergyProcessor::with_config(config);
            let report = processor.dashboard(&records, timeframe, Utc::now());
            print_json(&report, pretty)?;
            Ok(())
        }

        Commands::Status {
            input,
            input_format,
        } => {
            let records = read_records(&input, &input_format)?;
            let readings = Normalizer::normalize_batch(&records);
            let state =
                gridsense::liveness::evaluate(gridsense::liveness::latest_reading(&readings), Utc::now());
            println!("{state}");
            Ok(())
        }

        Commands::Doctor { json } => cmd_doctor(json),
    }
}

fn read_input(path: &PathBuf) -> Result<String, CliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn read_records(
    path: &PathBuf,
    format: &InputFormat,
) -> Result<HashMap<String, RawReading>, CliError> {
    let data = read_input(path)?;
    match format {
        InputFormat::Map => Ok(serde_json::from_str(&data)?),
        InputFormat::Ndjson => {
            let mut records = HashMap::new();
            for (i, line) in data.lines().enumerate() {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let raw: RawReading = serde_json::from_str(trimmed)?;
                records.insert(format!("line-{i}"), raw);
            }
            Ok(records)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    if pretty {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}

fn cmd_doctor(json: bool) -> Result<(), CliError> {
    let stdin_is_tty = atty::is(atty::Stream::Stdin);
    let config = EngineConfig::default();

    if json {
        let report = serde_json::json!({
            "producer": PRODUCER_NAME,
            "version": ENGINE_VERSION,
            "stdin_is_tty": stdin_is_tty,
            "default_rate_per_kwh": config.rate_per_kwh,
            "effective_goal_kwh": config.effective_goal_kwh(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{PRODUCER_NAME} {ENGINE_VERSION}");
        println!("stdin: {}", if stdin_is_tty { "tty (pipe data or pass --input)" } else { "piped" });
        println!("default rate: {} per kWh", config.rate_per_kwh);
        println!("effective goal: {} kWh", config.effective_goal_kwh());
    }
    Ok(())
}
