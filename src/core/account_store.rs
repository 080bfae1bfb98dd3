//! Committed account state
//!
//! This module provides the `AccountStore` struct which holds the settled balance
//! of every provisioned account, together with the ids of the transactions applied
//! by the most recent settlement.
//!
//! The AccountStore is responsible for:
//! - Provisioning accounts from an initial balance list (later entries win)
//! - Answering balance lookups for staging
//! - Committing a settlement's final balances in one step
//! - Providing sorted balance listings for output

use crate::types::{AccountBalance, AccountId, Balance, TransactionId};
use std::collections::{BTreeMap, HashMap};

/// Committed balances of all accounts
///
/// The store never exposes its maps directly; the ledger holds it behind a
/// read/write lock and reaches it only through these methods.
#[derive(Debug, Default)]
pub struct AccountStore {
    /// Map of account ids to committed balances
    balances: HashMap<AccountId, Balance>,

    /// Transactions applied by the most recent settlement, ascending
    applied: Vec<TransactionId>,
}

impl AccountStore {
    /// Create an empty AccountStore
    pub fn new() -> Self {
        AccountStore {
            balances: HashMap::new(),
            applied: Vec::new(),
        }
    }

    /// Provision accounts from an ordered list of initial balances
    ///
    /// If an account appears more than once, the later balance overwrites the
    /// earlier one rather than being added to it.
    pub fn from_initial<I>(initial: I) -> Self
    where
        I: IntoIterator<Item = AccountBalance>,
    {
        let mut store = AccountStore::new();
        for entry in initial {
            store.balances.insert(entry.account, entry.balance);
        }
        store
    }

    /// Committed balance of an account, if it exists
    pub fn balance(&self, account: AccountId) -> Option<Balance> {
        self.balances.get(&account).copied()
    }

    /// All committed balances sorted by account id
    pub fn snapshot(&self) -> BTreeMap<AccountId, Balance> {
        self.balances
            .iter()
            .map(|(&account, &balance)| (account, balance))
            .collect()
    }

    /// Transactions applied by the most recent settlement
    pub fn applied_transactions(&self) -> &[TransactionId] {
        &self.applied
    }

    /// Commit the outcome of a settlement
    ///
    /// Every balance in `finals` replaces the committed balance of its account and
    /// the applied list is replaced wholesale. Callers compute every final balance
    /// before calling this, so a settlement is never partially committed.
    pub fn commit(&mut self, finals: Vec<(AccountId, Balance)>, applied: Vec<TransactionId>) {
        for (account, balance) in finals {
            self.balances.insert(account, balance);
        }
        self.applied = applied;
    }
}
