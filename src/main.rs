//! Command-line front end for the adjudicator.
//!
//! Reads JSON snapshots from a file or stdin, writes the snapshot of the
//! following phase to stdout. Logs go to stderr.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use adjudicator::board::{initial_state, Subregion};
use adjudicator::engine::{Engine, EngineConfig, EngineError};
use adjudicator::protocol::notation::format_line;
use adjudicator::protocol::snapshot::{Snapshot, SnapshotError};

#[derive(Parser)]
#[command(name = "adjudicator")]
#[command(about = "Diplomacy order adjudicator", version)]
struct Cli {
    /// Engine config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `adjudicator::resolve=debug`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the orders in a snapshot and print the next snapshot
    Adjudicate {
        /// Snapshot file; stdin when absent or `-`
        input: Option<PathBuf>,

        /// Input is a JSON array of independent snapshots
        #[arg(long)]
        batch: bool,

        /// Fail on illegal orders instead of dropping them
        #[arg(long)]
        strict: bool,

        /// Threads for batch mode (0 = one per core)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// List the legal orders for a subregion, e.g. `par.l` or `stp.sc.s`
    Options {
        subregion: Subregion,

        /// Snapshot file; stdin when absent or `-`
        input: Option<PathBuf>,
    },

    /// Print the standard opening position
    Init,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), EngineError> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Adjudicate {
            input,
            batch,
            strict,
            threads,
        } => {
            config.strict |= strict;
            if let Some(threads) = threads {
                config.threads = threads;
            }
            let engine = Engine::new(config);
            let text = read_input(input.as_deref())?;
            if batch {
                let snapshots: Vec<Snapshot> = serde_json::from_str(&text).map_err(SnapshotError::Json)?;
                let next = engine
                    .adjudicate_batch(&snapshots)?
                    .into_iter()
                    .collect::<Result<Vec<_>, _>>()?;
                let json = serde_json::to_string_pretty(&next).map_err(SnapshotError::Json)?;
                write_output(&json)
            } else {
                let next = engine.step(&Snapshot::from_json(&text)?)?;
                write_output(&next.to_json()?)
            }
        }
        Commands::Options { subregion, input } => {
            let snapshot = Snapshot::from_json(&read_input(input.as_deref())?)?;
            let lines: Vec<String> = Engine::new(config)
                .options(&snapshot, subregion)
                .iter()
                .map(format_line)
                .collect();
            write_output(&lines.join("\n"))
        }
        Commands::Init => write_output(&Snapshot::from_state(&initial_state()).to_json()?),
    }
}

fn read_input(path: Option<&Path>) -> Result<String, EngineError> {
    match path {
        Some(path) if path != Path::new("-") => Ok(Snapshot::read_file(path)?),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|source| EngineError::Io {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            Ok(text)
        }
    }
}

fn write_output(text: &str) -> Result<(), EngineError> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    writeln!(out, "{}", text)
        .and_then(|_| out.flush())
        .map_err(|source| EngineError::Io {
            path: "<stdout>".to_string(),
            source,
        })
}
