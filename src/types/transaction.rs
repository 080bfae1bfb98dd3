//! Transaction-related types for the settlement ledger
//!
//! A [`Transaction`] groups one or more [`Transfer`]s that are staged together
//! and either applied or discarded together at settlement.

use super::account::{AccountId, Balance};

/// Transaction identifier
///
/// Assigned by the ledger at staging time, starting at 1 after every settlement.
pub type TransactionId = u64;

/// A movement of money from one account to another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Account debited by `amount`
    pub from: AccountId,

    /// Account credited by `amount`
    pub to: AccountId,

    /// Amount moved; expected positive but not enforced
    pub amount: Balance,
}

impl Transfer {
    pub fn new(from: AccountId, to: AccountId, amount: Balance) -> Self {
        Transfer { from, to, amount }
    }
}

/// An ordered set of transfers submitted together
///
/// An empty transaction can be built but is rejected by the ledger when staged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    transfers: Vec<Transfer>,
}

impl Transaction {
    pub fn new(transfers: Vec<Transfer>) -> Self {
        Transaction { transfers }
    }

    /// The transfers in submission order
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn push(&mut self, transfer: Transfer) {
        self.transfers.push(transfer);
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }
}

impl FromIterator<Transfer> for Transaction {
    fn from_iter<I: IntoIterator<Item = Transfer>>(iter: I) -> Self {
        Transaction::new(iter.into_iter().collect())
    }
}

/// Outcome of a successful settlement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementReport {
    /// Transaction ids folded into the committed balances, ascending
    pub applied: Vec<TransactionId>,

    /// Transaction ids excluded to keep balances non-negative, ascending
    pub rejected: Vec<TransactionId>,
}
