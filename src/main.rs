//! Settlement ledger CLI
//!
//! Loads account balances, stages every transaction from a CSV file, settles
//! once and prints the committed balances.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- accounts.csv transactions.csv > balances.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 accounts.csv transactions.csv
//! cargo run -- --applied-output applied.csv accounts.csv transactions.csv
//! RUST_LOG=settlement_ledger=debug cargo run -- accounts.csv transactions.csv
//! ```
//!
//! Balances go to stdout, logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, unwritable output, etc.)

use settlement_ledger::cli::{self, CliArgs};
use settlement_ledger::io::write_applied_csv;
use settlement_ledger::strategy;
use settlement_ledger::LedgerError;
use std::fs::File;
use std::process;
use tracing_subscriber::EnvFilter;

fn run(args: &CliArgs) -> Result<(), LedgerError> {
    let config = if args.strategy == cli::StrategyType::Async {
        Some(args.to_batch_config())
    } else {
        None
    };
    let strategy = strategy::create_strategy(args.strategy.clone(), config);

    let mut output = std::io::stdout();
    let report = strategy.process(&args.accounts_file, &args.transactions_file, &mut output)?;

    if let Some(path) = &args.applied_output {
        let mut file = File::create(path)?;
        write_applied_csv(&report.applied, &mut file)?;
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = cli::parse_args();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
