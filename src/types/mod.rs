//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account identifiers, balances and provisioning entries
//! - `transaction`: Transfers, transactions and settlement reports
//! - `error`: Error types for the ledger

pub mod account;
pub mod error;
pub mod transaction;

pub use account::{AccountBalance, AccountId, Balance};
pub use error::{AccountRole, LedgerError};
pub use transaction::{SettlementReport, Transaction, TransactionId, Transfer};
