//! Processing strategy module for ledger runs
//!
//! This module defines the Strategy pattern for complete processing pipelines:
//! loading accounts, staging every transaction read from CSV, settling once and
//! writing the committed balances. Different implementations (synchronous,
//! asynchronous batch) can be selected at runtime.

use crate::cli::StrategyType;
use crate::core::Ledger;
use crate::types::{LedgerError, SettlementReport, Transaction};
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete ledger pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Stage all transactions, settle, and write balances to output
    ///
    /// # Arguments
    ///
    /// * `accounts_path` - CSV file with the initial `account,balance` entries
    /// * `transactions_path` - CSV file with `tx,from,to,amount` rows
    /// * `output` - Writer receiving the settled balances as CSV
    ///
    /// # Returns
    ///
    /// The settlement report. An input with no stageable transaction yields an
    /// empty report and the initial balances.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An input file cannot be opened or the accounts file cannot be parsed
    /// - A settled balance overflows
    /// - Output cannot be written
    ///
    /// Errors on individual transactions are logged and do not stop processing.
    fn process(
        &self,
        accounts_path: &Path,
        transactions_path: &Path,
        output: &mut dyn Write,
    ) -> Result<SettlementReport, LedgerError>;
}

/// Settle `ledger`, treating an empty cycle as an empty report
pub(crate) fn settle(ledger: &Ledger) -> Result<SettlementReport, LedgerError> {
    match ledger.settle() {
        Err(LedgerError::NothingToSettle) => {
            tracing::info!("no staged transactions to settle");
            Ok(SettlementReport::default())
        }
        other => other,
    }
}

/// Stage one transaction, logging a rejection instead of failing
pub(crate) fn stage_or_log(ledger: &Ledger, transaction: &Transaction) {
    if let Err(e) = ledger.stage_transaction(transaction) {
        tracing::warn!(error = %e, "transaction rejected at staging");
    }
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `config` - Optional configuration for async batch processing (ignored for sync)
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config))
        }
    }
}
