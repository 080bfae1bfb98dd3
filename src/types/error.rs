//! Error types for the settlement ledger
//!
//! This module defines all error types that can occur while staging, settling,
//! or feeding transactions into the ledger from external inputs.
//!
//! # Error Categories
//!
//! - **Staging Errors**: Empty transactions, unknown accounts, delta overflow
//! - **Settlement Errors**: Nothing staged, balance overflow
//! - **Input Errors**: File not found, CSV parse errors, malformed encodings
//!
//! Staging and settlement errors are always recoverable: the ledger is left in a
//! consistent state and the caller decides whether to retry.

use super::account::AccountId;
use super::transaction::TransactionId;
use std::fmt;
use thiserror::Error;

/// Which side of a transfer referenced an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    Source,
    Destination,
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRole::Source => write!(f, "source"),
            AccountRole::Destination => write!(f, "destination"),
        }
    }
}

/// Main error type for the settlement ledger
///
/// Each variant carries enough context to identify the offending transaction,
/// account, or input position.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Transaction carries no transfers
    #[error("Invalid transaction {tx}: {reason}")]
    InvalidTransaction {
        /// Id assigned to the rejected transaction
        tx: TransactionId,
        /// Why the transaction was rejected
        reason: String,
    },

    /// A transfer references an account that was never provisioned
    ///
    /// The whole transaction is rejected and none of its transfers are staged.
    #[error("{role} account {account} not present, transaction {tx} rejected")]
    UnknownAccount {
        /// Id assigned to the rejected transaction
        tx: TransactionId,
        /// The missing account
        account: AccountId,
        /// Whether the account was the source or destination of the transfer
        role: AccountRole,
    },

    /// Settle was called with no staged account state
    #[error("Nothing to settle")]
    NothingToSettle,

    /// A delta or final balance does not fit in a balance
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account whose balance would overflow
        account: AccountId,
    },

    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// The malformed row is skipped and processing continues.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// One of the rows of a CSV transaction group could not be converted
    ///
    /// The whole group is dropped so that no partial transaction is staged.
    #[error("Malformed transaction '{label}': {message}")]
    MalformedTransaction {
        /// Grouping label from the input file
        label: u64,
        /// Description of the first conversion failure in the group
        message: String,
    },

    /// Compact scenario encoding is truncated or out of range
    #[error("Invalid scenario encoding at position {position}: {message}")]
    InvalidEncoding {
        /// Index into the encoded input
        position: usize,
        /// What was expected at that position
        message: String,
    },

    /// The async runtime could not be built or a task failed
    #[error("Runtime error: {message}")]
    RuntimeError {
        /// Description of the runtime failure
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<csv_async::Error> for LedgerError {
    fn from(error: csv_async::Error) -> Self {
        LedgerError::ParseError {
            line: None,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvalidTransaction error
    pub fn invalid_transaction(tx: TransactionId, reason: &str) -> Self {
        LedgerError::InvalidTransaction {
            tx,
            reason: reason.to_string(),
        }
    }

    /// Create an UnknownAccount error
    pub fn unknown_account(tx: TransactionId, account: AccountId, role: AccountRole) -> Self {
        LedgerError::UnknownAccount { tx, account, role }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Create a MalformedTransaction error
    pub fn malformed_transaction(label: u64, message: &str) -> Self {
        LedgerError::MalformedTransaction {
            label,
            message: message.to_string(),
        }
    }

    /// Create an InvalidEncoding error
    pub fn invalid_encoding(position: usize, message: &str) -> Self {
        LedgerError::InvalidEncoding {
            position,
            message: message.to_string(),
        }
    }

    /// Create a RuntimeError
    pub fn runtime(message: impl fmt::Display) -> Self {
        LedgerError::RuntimeError {
            message: message.to_string(),
        }
    }

    /// Map an error from opening `path`, reporting missing files distinctly
    pub fn open_failed(path: &std::path::Path, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            LedgerError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            LedgerError::IoError {
                message: format!("Failed to open file '{}': {}", path.display(), error),
            }
        }
    }
}
