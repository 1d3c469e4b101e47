use std::error::Error;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use parscale::BenchEngine;
use serde_json::{json, Map, Value};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Measure how a fixed f32 kernel scales across a bounded worker pool.
#[derive(Debug, Parser)]
#[command(name = "parscale", version, about)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one benchmark and print its JSON report.
    Run {
        /// Workers for the current run, 1..=64 (default 4).
        #[arg(long, env = "PARSCALE_THREAD_COUNT")]
        thread_count: Option<String>,

        #[command(flatten)]
        bench: BenchArgs,

        /// Pretty-print the report.
        #[arg(long)]
        pretty: bool,
    },
    /// Run one benchmark per thread count, reusing the cached matrices.
    Sweep {
        /// Comma-separated thread counts.
        #[arg(long, value_delimiter = ',', default_values = ["1", "2", "4", "8"])]
        threads: Vec<String>,

        #[command(flatten)]
        bench: BenchArgs,

        /// Print one JSON report per line instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Report that the engine is available.
    Ping,
}

/// Raw option values; malformed ones fall back to defaults.
#[derive(Debug, Clone, Args)]
struct BenchArgs {
    /// Rows per chunk task, 1..=4096 (default 128).
    #[arg(long, env = "PARSCALE_CHUNK_SIZE")]
    chunk_size: Option<String>,

    /// Square matrix dimension, 128..=4096 (default 1024).
    #[arg(long, env = "PARSCALE_MATRIX_SIZE")]
    matrix_size: Option<String>,

    /// Timed passes per run, 1..=15 (default 5).
    #[arg(long, env = "PARSCALE_REPEATS")]
    repeats: Option<String>,
}

impl BenchArgs {
    fn to_raw(&self, thread_count: Option<&str>) -> Map<String, Value> {
        let fields = [
            ("thread_count", thread_count),
            ("chunk_size", self.chunk_size.as_deref()),
            ("matrix_size", self.matrix_size.as_deref()),
            ("repeats", self.repeats.as_deref()),
        ];

        fields
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name.to_string(), Value::from(v))))
            .collect()
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    let engine = BenchEngine::default();

    match command {
        Command::Run {
            thread_count,
            bench,
            pretty,
        } => {
            let report = engine.run_benchmark(&bench.to_raw(thread_count.as_deref()))?;
            let rendered = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{rendered}");
        }
        Command::Sweep {
            threads,
            bench,
            json,
        } => {
            for thread_count in &threads {
                let report = engine.run_benchmark(&bench.to_raw(Some(thread_count)))?;
                if json {
                    println!("{}", serde_json::to_string(&report)?);
                } else {
                    println!(
                        "threads={:>2}  chunk={:>4}  n={:>4}  t1={:.6}s  tp={:.6}s  speedup={:>6.2}  efficiency={:>5.2}",
                        report.config.thread_count,
                        report.config.chunk_size,
                        report.config.matrix_size,
                        report.metrics.baseline_median_s,
                        report.metrics.current_median_s,
                        report.metrics.speedup,
                        report.metrics.efficiency,
                    );
                }
            }
        }
        Command::Ping => {
            println!("{}", json!({"ok": true, "msg": "parscale is ready"}));
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "benchmark failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
