//! probedb command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Interactive session on chaining tables
//! probedb --store chaining
//!
//! # Random workload, 100k statements
//! probedb evaluate --queries 100000 --seed 7
//!
//! # Acceptance checks on the student table
//! probedb custom
//! ```

use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use probedb::config::DEFAULT_KEY_COLUMN;
use probedb::workload::{self, WorkloadConfig};
use probedb::{Database, EngineConfig, StoreKind, scenario};

const PROMPT: &str = "probedb> ";

/// In-memory SQL engine over interchangeable hash table strategies
#[derive(Parser, Debug)]
#[command(name = "probedb", version, about)]
struct Args {
    /// Collision-resolution strategy for every table: chaining, linear,
    /// quadratic or double
    #[arg(
        short,
        long,
        default_value = "linear",
        value_parser = StoreKind::from_str,
        env = "PROBEDB_STORE",
        global = true
    )]
    store: StoreKind,

    /// Column whose value keys each row
    #[arg(short, long, default_value = DEFAULT_KEY_COLUMN, env = "PROBEDB_KEY_COLUMN", global = true)]
    key_column: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Read statements interactively (default)
    Repl,
    /// Run the random three-table workload
    Evaluate {
        /// Number of random statements
        #[arg(short, long, default_value_t = 1_000_000)]
        queries: usize,
        /// Seed of the statement generator
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Run the student-table acceptance checks
    Custom,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = EngineConfig::default()
        .with_store(args.store)
        .with_key_column(args.key_column);
    info!(store = %config.store, key_column = %config.key_column, "starting");
    let mut db = Database::new(config);

    match args.mode.unwrap_or(Mode::Repl) {
        Mode::Repl => run_repl(&mut db),
        Mode::Evaluate { queries, seed } => run_evaluate(&mut db, queries, seed),
        Mode::Custom => run_custom(&mut db),
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("probedb=debug")
        } else {
            EnvFilter::new("probedb=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn run_repl(db: &mut Database) -> Result<ExitCode> {
    let mut editor = DefaultEditor::new().context("failed to start line editor")?;

    println!("probedb {}", env!("CARGO_PKG_VERSION"));
    println!("Enter SQL statements, 'evaluate', 'custom' or 'exit'.");

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Err(e) = editor.add_history_entry(line) {
                    debug!("failed to record history: {}", e);
                }

                match line.to_lowercase().as_str() {
                    "exit" => break,
                    "evaluate" => {
                        let defaults = WorkloadConfig::default();
                        return run_evaluate(db, defaults.queries, defaults.seed);
                    }
                    "custom" => return run_custom(db),
                    _ => println!("{}", db.run(line)),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                error!("Readline error: {}", e);
                break;
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn run_evaluate(db: &mut Database, queries: usize, seed: u64) -> Result<ExitCode> {
    let config = WorkloadConfig {
        queries,
        seed,
        ..WorkloadConfig::default()
    };
    let report = workload::run(db, &config).context("failed to set up workload tables")?;
    println!("{report}");
    Ok(ExitCode::SUCCESS)
}

fn run_custom(db: &mut Database) -> Result<ExitCode> {
    println!("Setting up database...");
    let outcomes = scenario::run(db).context("failed to set up student table")?;

    println!("Running custom test cases...");
    let mut failed = 0;
    for outcome in &outcomes {
        println!("Executing query: {}", outcome.query);
        if outcome.passed {
            println!("Test PASSED");
        } else {
            failed += 1;
            println!("Test FAILED");
            println!("Expected: {:?}", outcome.expected);
            println!("Actual: {:?}", outcome.actual);
        }
        println!();
    }
    println!("{} of {} checks passed.", outcomes.len() - failed, outcomes.len());

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_flag_uses_store_kind_names() {
        let args = Args::try_parse_from(["probedb", "--store", "quadratic", "custom"]).unwrap();
        assert_eq!(args.store, StoreKind::QuadraticProbe);
        assert!(matches!(args.mode, Some(Mode::Custom)));

        let args = Args::try_parse_from(["probedb", "evaluate", "-s", "double-hash"]).unwrap();
        assert_eq!(args.store, StoreKind::DoubleHash);
    }

    #[test]
    fn test_unknown_store_is_rejected() {
        assert!(Args::try_parse_from(["probedb", "--store", "cuckoo"]).is_err());
    }
}
