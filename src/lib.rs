//! Settlement Ledger Library
//! # Overview
//!
//! This library provides an in-memory, two-phase ledger. Multi-transfer
//! transactions are staged against committed account balances and later settled
//! in a single pass that discards any transaction which would leave an account
//! negative.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (AccountBalance, Transfer, Transaction, LedgerError)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Ledger components:
//!   - [`core::ledger`] - Staging and settlement orchestration behind two locks
//!   - [`core::staging_area`] - Tentative per-account deltas and the id counter
//!   - [`core::account_store`] - Committed balances and last applied ids
//!   - [`core::selector`] - Choice of transactions to exclude at settlement
//! - [`io`] - CSV readers and writers, plus the compact scenario encoding
//! - [`strategy`] - Sync and async processing pipelines
//!
//! # Lifecycle
//!
//! - **Stage**: each call is assigned the next id (1, 2, ...) and records the net
//!   effect of the transaction on every account it touches. A transaction naming
//!   an unknown account is rejected whole.
//! - **Settle**: per account, the most recent debits are excluded until the
//!   balance is covered. An id excluded on any account is excluded everywhere.
//!   The surviving deltas are committed and the id counter restarts at 1.
//!
//! ```
//! use settlement_ledger::{AccountBalance, Ledger, Transaction, Transfer};
//!
//! let ledger = Ledger::new([AccountBalance::new(1, 5), AccountBalance::new(2, 10)]);
//! let tx = ledger
//!     .stage_transaction(&Transaction::new(vec![Transfer::new(1, 2, 3)]))
//!     .unwrap();
//! let report = ledger.settle().unwrap();
//!
//! assert_eq!(report.applied, vec![tx]);
//! assert_eq!(ledger.balance(1), Some(2));
//! ```

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{Ledger, LedgerPhase};
pub use io::{write_applied_csv, write_balances_csv};
pub use types::{
    AccountBalance, AccountId, AccountRole, Balance, LedgerError, SettlementReport, Transaction,
    TransactionId, Transfer,
};
