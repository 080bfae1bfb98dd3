//! Core ledger logic module
//!
//! This module contains the staging and settlement components:
//! - `account_store` - Committed balances and the last applied transaction ids
//! - `staging_area` - Tentative per-account deltas and the transaction id counter
//! - `selector` - Pure selection of transactions to exclude at settlement
//! - `ledger` - Orchestration and locking

pub mod account_store;
pub mod ledger;
pub mod selector;
pub mod staging_area;

pub use account_store::AccountStore;
pub use ledger::{Ledger, LedgerPhase};
pub use selector::{resolve_exclusions, select_invalid_transactions};
pub use staging_area::{AccountState, StagingArea};
