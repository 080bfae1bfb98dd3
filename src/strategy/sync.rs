//! Synchronous processing strategy
//!
//! This module provides a synchronous, single-threaded implementation of the
//! ProcessingStrategy trait.
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `read_accounts` and `SyncReader` (iterator interface)
//! - Staging and settlement to the `Ledger`
//! - CSV output to `csv_format::write_balances_csv`
//!
//! Transactions are staged in file order, so ids match the order of the
//! transaction groups in the input.

use crate::core::Ledger;
use crate::io::csv_format::write_balances_csv;
use crate::io::sync_reader::{read_accounts, SyncReader};
use crate::strategy::{settle, stage_or_log, ProcessingStrategy};
use crate::types::{LedgerError, SettlementReport};
use std::io::Write;
use std::path::Path;

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use settlement_ledger::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy;
/// let mut output = io::stdout();
///
/// strategy
///     .process(Path::new("accounts.csv"), Path::new("transactions.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        accounts_path: &Path,
        transactions_path: &Path,
        output: &mut dyn Write,
    ) -> Result<SettlementReport, LedgerError> {
        let ledger = Ledger::new(read_accounts(accounts_path)?);
        let reader = SyncReader::new(transactions_path)?;

        for result in reader {
            match result {
                Ok(transaction) => stage_or_log(&ledger, &transaction),
                Err(e) => tracing::warn!(error = %e, "skipping transaction input"),
            }
        }

        let report = settle(&ledger)?;
        write_balances_csv(&ledger.balances(), output)?;

        Ok(report)
    }
}
