//! Tentative per-account state between settlements
//!
//! This module provides the `StagingArea`, which records the net effect of every
//! staged transaction on every account it touches, and owns the transaction id
//! counter for the current settlement cycle.
//!
//! # Design
//!
//! Each touched account gets an [`AccountState`] holding the committed balance
//! captured when the account was first touched in this cycle, and an ordered map
//! of transaction id to net delta. A transaction that touches the same account
//! through several transfers contributes a single pre-summed delta.
//!
//! Staging validates the whole transaction before recording anything, so a
//! rejected transaction never leaves partial deltas behind.

use crate::core::account_store::AccountStore;
use crate::types::{
    AccountId, AccountRole, Balance, LedgerError, Transaction, TransactionId,
};
use std::collections::{BTreeMap, HashMap};

/// Tentative state of one account in the current cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    initial_balance: Balance,
    deltas: BTreeMap<TransactionId, Balance>,
}

impl AccountState {
    pub fn new(initial_balance: Balance) -> Self {
        AccountState {
            initial_balance,
            deltas: BTreeMap::new(),
        }
    }

    /// Committed balance captured when the account was first touched
    pub fn initial_balance(&self) -> Balance {
        self.initial_balance
    }

    /// Net delta per staged transaction, ordered by transaction id
    pub fn deltas(&self) -> &BTreeMap<TransactionId, Balance> {
        &self.deltas
    }

    /// Delta recorded by one transaction, if it touched this account
    #[cfg(test)]
    pub fn delta(&self, tx: TransactionId) -> Option<Balance> {
        self.deltas.get(&tx).copied()
    }

    fn record(&mut self, tx: TransactionId, delta: Balance) {
        self.deltas.insert(tx, delta);
    }
}

/// Staged account states plus the scoped id counter
#[derive(Debug, Default)]
pub struct StagingArea {
    accounts: HashMap<AccountId, AccountState>,
    last_id: TransactionId,
}

impl StagingArea {
    pub fn new() -> Self {
        StagingArea {
            accounts: HashMap::new(),
            last_id: 0,
        }
    }

    /// Advance the counter and return the id for the next staging attempt
    pub fn next_id(&mut self) -> TransactionId {
        self.last_id += 1;
        self.last_id
    }

    /// Highest id handed out in this cycle (0 if none)
    pub fn last_id(&self) -> TransactionId {
        self.last_id
    }

    /// Whether any account carries tentative state
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    #[cfg(test)]
    pub fn account(&self, account: AccountId) -> Option<&AccountState> {
        self.accounts.get(&account)
    }

    pub fn accounts(&self) -> impl Iterator<Item = (AccountId, &AccountState)> {
        self.accounts.iter().map(|(&account, state)| (account, state))
    }

    /// Record the effect of `transaction` under id `tx`
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the staging area untouched, if:
    /// - The transaction has no transfers
    /// - Any transfer references an account missing from `store`
    /// - The net delta of the transaction on an account overflows
    pub fn stage(
        &mut self,
        tx: TransactionId,
        transaction: &Transaction,
        store: &AccountStore,
    ) -> Result<(), LedgerError> {
        if transaction.is_empty() {
            return Err(LedgerError::invalid_transaction(
                tx,
                "transaction has no transfers",
            ));
        }

        // account -> (committed balance, net delta of this transaction)
        let mut effects: BTreeMap<AccountId, (Balance, Balance)> = BTreeMap::new();

        for transfer in transaction.transfers() {
            let from_balance = store
                .balance(transfer.from)
                .ok_or_else(|| LedgerError::unknown_account(tx, transfer.from, AccountRole::Source))?;
            let to_balance = store.balance(transfer.to).ok_or_else(|| {
                LedgerError::unknown_account(tx, transfer.to, AccountRole::Destination)
            })?;

            let source = effects.entry(transfer.from).or_insert((from_balance, 0));
            source.1 = source
                .1
                .checked_sub(transfer.amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("stage", transfer.from))?;

            let destination = effects.entry(transfer.to).or_insert((to_balance, 0));
            destination.1 = destination
                .1
                .checked_add(transfer.amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("stage", transfer.to))?;
        }

        for (account, (committed, delta)) in effects {
            self.accounts
                .entry(account)
                .or_insert_with(|| AccountState::new(committed))
                .record(tx, delta);
        }

        Ok(())
    }

    /// Drop all tentative state and restart the id counter
    pub fn reset(&mut self) {
        self.accounts.clear();
        self.last_id = 0;
    }
}
