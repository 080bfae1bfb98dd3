//! CSV format handling for ledger input and output
//!
//! This module centralizes all CSV format concerns, providing:
//! - Record structures for the accounts and transfers files
//! - Conversion from transfer rows to domain types
//! - Grouping of consecutive rows into transactions
//! - Balance and applied-transaction output serialization
//!
//! All functions are pure (no I/O beyond the supplied writer) for easy testing.
//!
//! # Formats
//!
//! ```text
//! accounts.csv          transactions.csv        balances output
//! account,balance       tx,from,to,amount       account,balance
//! 1,5                   1,1,2,3                 1,4
//! 2,10                  1,3,1,2                 2,13
//! ```
//!
//! Rows of the transactions file that share a `tx` label and appear next to each
//! other form one transaction. The label only groups rows; the ledger assigns its
//! own ids at staging time.

use crate::types::{AccountId, Balance, LedgerError, Transaction, TransactionId, Transfer};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for one transfer row
///
/// The account and amount columns are kept as strings so that a bad value can be
/// attributed to its transaction group instead of dropping the row silently.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvTransferRecord {
    pub tx: u64,
    pub from: String,
    pub to: String,
    pub amount: String,
}

fn parse_field<T: FromStr>(value: &str, field: &str, label: u64) -> Result<T, LedgerError> {
    value.trim().parse().map_err(|_| {
        LedgerError::malformed_transaction(label, &format!("invalid {} '{}'", field, value))
    })
}

/// Convert a CsvTransferRecord to its group label and Transfer
///
/// # Errors
///
/// Returns `MalformedTransaction` naming the group if any field fails to parse.
pub fn convert_transfer_record(record: CsvTransferRecord) -> Result<(u64, Transfer), LedgerError> {
    let label = record.tx;
    let from: AccountId = parse_field(&record.from, "from", label)?;
    let to: AccountId = parse_field(&record.to, "to", label)?;
    let amount: Balance = parse_field(&record.amount, "amount", label)?;

    Ok((label, Transfer::new(from, to, amount)))
}

/// Groups consecutive transfer rows into transactions
///
/// A group containing a row that failed conversion, or that lost a row the
/// reader could not decode, is emitted as an error once the group is complete,
/// so a partially parsed transaction is never staged.
#[derive(Debug, Default)]
pub struct TransactionAssembler {
    label: Option<u64>,
    transaction: Transaction,
    error: Option<LedgerError>,
}

impl TransactionAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one converted row
    ///
    /// Returns the previous group when `label` starts a new one.
    pub fn push(
        &mut self,
        label: u64,
        transfer: Result<Transfer, LedgerError>,
    ) -> Option<Result<Transaction, LedgerError>> {
        let completed = match self.label {
            Some(current) if current != label => self.take(),
            _ => None,
        };

        self.label = Some(label);
        match transfer {
            Ok(transfer) => self.transaction.push(transfer),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(e);
                }
            }
        }

        completed
    }

    /// Feed one raw CSV record
    pub fn push_record(
        &mut self,
        record: CsvTransferRecord,
    ) -> Option<Result<Transaction, LedgerError>> {
        let label = record.tx;
        self.push(label, convert_transfer_record(record).map(|(_, transfer)| transfer))
    }

    /// Mark the open group as failed after one of its rows could not be read
    ///
    /// Does nothing when no group is open.
    pub fn poison(&mut self, error: &LedgerError) {
        if let Some(label) = self.label {
            if self.error.is_none() {
                self.error = Some(LedgerError::malformed_transaction(
                    label,
                    &format!("unreadable row: {}", error),
                ));
            }
        }
    }

    /// Flush the last group at end of input
    pub fn finish(&mut self) -> Option<Result<Transaction, LedgerError>> {
        self.take()
    }

    fn take(&mut self) -> Option<Result<Transaction, LedgerError>> {
        self.label.take()?;
        let transaction = std::mem::take(&mut self.transaction);
        Some(match self.error.take() {
            Some(e) => Err(e),
            None => Ok(transaction),
        })
    }
}

/// Write committed balances in CSV format
///
/// Writes columns `account,balance`, sorted by account id.
pub fn write_balances_csv(
    balances: &BTreeMap<AccountId, Balance>,
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["account", "balance"])?;
    for (account, balance) in balances {
        writer.write_record(&[account.to_string(), balance.to_string()])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write applied transaction ids in CSV format
///
/// Writes a single `tx` column in the given order.
pub fn write_applied_csv(
    applied: &[TransactionId],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["tx"])?;
    for tx in applied {
        writer.write_record(&[tx.to_string()])?;
    }

    writer.flush()?;
    Ok(())
}
