//! Synchronous CSV readers
//!
//! Provides the accounts loader and a streaming iterator over transactions from
//! a transfers CSV file. Delegates CSV format concerns to the csv_format module.
//!
//! # Design
//!
//! The SyncReader pulls transfer rows one at a time through csv::Reader and feeds
//! them to a `TransactionAssembler`, which yields a transaction whenever the `tx`
//! label changes. Only the rows of the transaction being assembled are held in
//! memory.
//!
//! ```no_run
//! use settlement_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("transactions.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(transaction) => println!("{} transfers", transaction.len()),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()` and
//!   `read_accounts()`
//! - Rows that fail to deserialize are yielded as `ParseError` with their line
//! - Groups with an unparseable field, or that were open when such a row was
//!   hit, are yielded as `MalformedTransaction`

use crate::io::csv_format::{CsvTransferRecord, TransactionAssembler};
use crate::types::{AccountBalance, LedgerError, Transaction};
use csv::{DeserializeRecordsIntoIter, ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

fn open_csv(path: &Path) -> Result<csv::Reader<File>, LedgerError> {
    let file = File::open(path).map_err(|e| LedgerError::open_failed(path, e))?;

    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .buffer_capacity(8 * 1024)
        .from_reader(file))
}

/// Load the provisioning list from an `account,balance` CSV file
///
/// Entries are returned in file order; duplicates are kept so the ledger can
/// apply its overwrite rule.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or any row fails to parse.
pub fn read_accounts(path: &Path) -> Result<Vec<AccountBalance>, LedgerError> {
    let mut reader = open_csv(path)?;

    let accounts = reader
        .deserialize::<AccountBalance>()
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(path = %path.display(), accounts = accounts.len(), "loaded accounts");
    Ok(accounts)
}

/// Synchronous transaction reader
///
/// Iterates over the transactions of a `tx,from,to,amount` CSV file.
pub struct SyncReader {
    records: DeserializeRecordsIntoIter<File, CsvTransferRecord>,
    assembler: TransactionAssembler,
}

impl SyncReader {
    /// Create a new SyncReader from a file path
    ///
    /// # Errors
    ///
    /// `FileNotFound` or `IoError` if the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let reader = open_csv(path)?;

        Ok(Self {
            records: reader.into_deserialize(),
            assembler: TransactionAssembler::new(),
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<Transaction, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.records.next() {
                Some(Ok(record)) => {
                    if let Some(completed) = self.assembler.push_record(record) {
                        return Some(completed);
                    }
                }
                Some(Err(e)) => {
                    let error = LedgerError::from(e);
                    self.assembler.poison(&error);
                    return Some(Err(error));
                }
                None => return self.assembler.finish(),
            }
        }
    }
}
