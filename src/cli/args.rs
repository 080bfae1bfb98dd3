use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Stage transfer transactions against provisioned accounts and settle them
#[derive(Parser, Debug)]
#[command(name = "settlement-ledger")]
#[command(about = "Stage transfer transactions and settle them in one pass", long_about = None)]
pub struct CliArgs {
    /// CSV file with the initial account balances
    #[arg(value_name = "ACCOUNTS", help = "Path to the accounts CSV file (account,balance)")]
    pub accounts_file: PathBuf,

    /// CSV file with the transfers to stage
    #[arg(
        value_name = "TRANSACTIONS",
        help = "Path to the transactions CSV file (tx,from,to,amount)"
    )]
    pub transactions_file: PathBuf,

    /// Processing strategy used to stage transactions
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Processing strategy: 'sync' stages in file order, 'async' stages batches concurrently"
    )]
    pub strategy: StrategyType,

    /// Number of transactions per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of transactions per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of concurrent staging tasks (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of staging tasks per batch (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Optional file receiving the applied transaction ids
    #[arg(
        long = "applied-output",
        value_name = "PATH",
        help = "Write the ids of applied transactions to this CSV file"
    )]
    pub applied_output: Option<PathBuf>,
}

/// Available processing strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values fall back to the defaults; zero values are replaced with
    /// defaults by `BatchConfig::new`, which logs a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_none() && self.max_concurrent_batches.is_none() {
            return BatchConfig::default();
        }

        let default = BatchConfig::default();
        BatchConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.max_concurrent_batches
                .unwrap_or(default.max_concurrent_batches),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::Path;

    #[rstest]
    #[case::default_strategy(&["program", "a.csv", "t.csv"], StrategyType::Sync)]
    #[case::explicit_sync(&["program", "--strategy", "sync", "a.csv", "t.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--strategy", "async", "a.csv", "t.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
    }

    #[test]
    fn test_positional_paths() {
        let parsed = CliArgs::try_parse_from(["program", "accounts.csv", "transactions.csv"]).unwrap();

        assert_eq!(parsed.accounts_file, Path::new("accounts.csv"));
        assert_eq!(parsed.transactions_file, Path::new("transactions.csv"));
        assert_eq!(parsed.applied_output, None);
    }

    #[test]
    fn test_applied_output() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--applied-output",
            "applied.csv",
            "a.csv",
            "t.csv",
        ])
        .unwrap();

        assert_eq!(parsed.applied_output.as_deref(), Some(Path::new("applied.csv")));
    }

    #[rstest]
    #[case::batch_size(&["program", "--batch-size", "2000", "a.csv", "t.csv"], Some(2000), None)]
    #[case::max_concurrent(&["program", "--max-concurrent", "8", "a.csv", "t.csv"], None, Some(8))]
    #[case::no_options(&["program", "a.csv", "t.csv"], None, None)]
    #[case::all_options(
        &["program", "--strategy", "async", "--batch-size", "2000", "--max-concurrent", "8", "a.csv", "t.csv"],
        Some(2000),
        Some(8)
    )]
    fn test_config_options(
        #[case] args: &[&str],
        #[case] batch_size: Option<usize>,
        #[case] max_concurrent: Option<usize>,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.batch_size, batch_size);
        assert_eq!(parsed.max_concurrent_batches, max_concurrent);
    }

    #[rstest]
    #[case::all_defaults(&["program", "a.csv", "t.csv"], 1000, num_cpus::get())]
    #[case::custom_batch_size(&["program", "--batch-size", "2000", "a.csv", "t.csv"], 2000, num_cpus::get())]
    #[case::custom_max_concurrent(&["program", "--max-concurrent", "8", "a.csv", "t.csv"], 1000, 8)]
    #[case::zero_batch_size(&["program", "--batch-size", "0", "a.csv", "t.csv"], 1000, num_cpus::get())]
    #[case::zero_max_concurrent(&["program", "--max-concurrent", "0", "a.csv", "t.csv"], 1000, num_cpus::get())]
    fn test_batch_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_batch_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_max_concurrent);
    }

    #[rstest]
    #[case::missing_inputs(&["program"])]
    #[case::missing_transactions(&["program", "a.csv"])]
    #[case::invalid_strategy(&["program", "--strategy", "invalid", "a.csv", "t.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
