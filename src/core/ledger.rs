//! Staging and settlement orchestration
//!
//! This module provides the `Ledger`, which coordinates the committed
//! [`AccountStore`], the tentative [`StagingArea`] and the exclusion selector.
//!
//! # Architecture
//!
//! ```text
//! Ledger
//!     ├── RwLock<StagingArea>   (tentative deltas + id counter)
//!     └── RwLock<AccountStore>  (committed balances + last applied ids)
//! ```
//!
//! # Locking
//!
//! - `stage_transaction` holds the staging write lock for its whole duration and
//!   takes the store read lock inside it to validate accounts.
//! - `settle` takes the staging write lock, then the store write lock, and keeps
//!   both until the outcome is committed and staging is cleared.
//! - Read accessors take only the store read lock.
//!
//! Locks are always acquired staging first, store second.

use crate::core::account_store::AccountStore;
use crate::core::selector::resolve_exclusions;
use crate::core::staging_area::StagingArea;
use crate::types::{
    AccountBalance, AccountId, Balance, LedgerError, SettlementReport, Transaction,
    TransactionId,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

/// Lifecycle phase of a ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerPhase {
    /// Nothing submitted since construction or the last settlement
    Empty,
    /// At least one transaction submitted since the last settlement
    Staging,
    /// A settlement is in progress
    Settling,
}

/// In-memory two-phase ledger
///
/// Shared across threads as `Arc<Ledger>`; every operation takes `&self`.
#[derive(Debug)]
pub struct Ledger {
    staging: RwLock<StagingArea>,
    committed: RwLock<AccountStore>,
    settling: AtomicBool,
}

impl Ledger {
    /// Create a ledger provisioned with the given accounts
    ///
    /// Later entries for the same account overwrite earlier ones.
    pub fn new<I>(initial: I) -> Self
    where
        I: IntoIterator<Item = AccountBalance>,
    {
        Ledger {
            staging: RwLock::new(StagingArea::new()),
            committed: RwLock::new(AccountStore::from_initial(initial)),
            settling: AtomicBool::new(false),
        }
    }

    /// Stage a transaction for the next settlement
    ///
    /// The transaction is assigned the next id whether or not staging succeeds.
    ///
    /// # Returns
    ///
    /// The id assigned to the transaction
    ///
    /// # Errors
    ///
    /// Returns an error, with no deltas recorded for any account, if:
    /// - The transaction has no transfers
    /// - A transfer references an account that does not exist
    /// - The net delta on an account overflows
    pub fn stage_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<TransactionId, LedgerError> {
        let mut staging = self.staging.write();
        let tx = staging.next_id();

        let committed = self.committed.read();
        staging.stage(tx, transaction, &committed)?;

        tracing::debug!(tx, transfers = transaction.len(), "staged transaction");
        Ok(tx)
    }

    /// Settle every staged transaction
    ///
    /// Computes the exclusion set, folds the surviving deltas into the committed
    /// balances and records the applied ids. Staging state and the id counter are
    /// cleared on every outcome.
    ///
    /// # Errors
    ///
    /// - `NothingToSettle` if no account carries tentative state
    /// - `ArithmeticOverflow` if a final balance does not fit; nothing is committed
    pub fn settle(&self) -> Result<SettlementReport, LedgerError> {
        let mut staging = self.staging.write();
        let mut committed = self.committed.write();
        self.settling.store(true, Ordering::Release);

        let outcome = Self::reconcile(&staging, &mut committed);

        staging.reset();
        self.settling.store(false, Ordering::Release);
        outcome
    }

    fn reconcile(
        staging: &StagingArea,
        committed: &mut AccountStore,
    ) -> Result<SettlementReport, LedgerError> {
        if staging.is_empty() {
            return Err(LedgerError::NothingToSettle);
        }

        let views: Vec<(Balance, &BTreeMap<TransactionId, Balance>)> = staging
            .accounts()
            .map(|(_, state)| (state.initial_balance(), state.deltas()))
            .collect();
        let excluded = resolve_exclusions(&views);

        let mut finals = Vec::new();
        let mut applied = BTreeSet::new();
        for (account, state) in staging.accounts() {
            let mut balance = state.initial_balance() as i128;
            for (&tx, &delta) in state.deltas() {
                if !excluded.contains(&tx) {
                    balance += delta as i128;
                    applied.insert(tx);
                }
            }
            let balance = Balance::try_from(balance)
                .map_err(|_| LedgerError::arithmetic_overflow("settle", account))?;
            finals.push((account, balance));
        }

        for &tx in &excluded {
            tracing::warn!(tx, "transaction excluded at settlement");
        }

        let report = SettlementReport {
            applied: applied.into_iter().collect(),
            rejected: excluded.into_iter().collect(),
        };
        tracing::info!(
            accounts = finals.len(),
            applied = report.applied.len(),
            rejected = report.rejected.len(),
            "settlement committed"
        );

        committed.commit(finals, report.applied.clone());
        Ok(report)
    }

    /// Committed balances as of the last completed settlement or construction
    pub fn balances(&self) -> BTreeMap<AccountId, Balance> {
        self.committed.read().snapshot()
    }

    /// Committed balance of one account
    pub fn balance(&self, account: AccountId) -> Option<Balance> {
        self.committed.read().balance(account)
    }

    /// Ids applied by the most recent settlement, ascending
    ///
    /// Empty before the first settlement.
    pub fn applied_transactions(&self) -> Vec<TransactionId> {
        self.committed.read().applied_transactions().to_vec()
    }

    /// Number of staging attempts since the last settlement
    pub fn pending_transactions(&self) -> TransactionId {
        self.staging.read().last_id()
    }

    /// Current lifecycle phase
    ///
    /// `Settling` is only observable from another thread while a `settle`
    /// call holds the locks.
    pub fn phase(&self) -> LedgerPhase {
        if self.settling.load(Ordering::Acquire) {
            return LedgerPhase::Settling;
        }
        if self.staging.read().last_id() == 0 {
            LedgerPhase::Empty
        } else {
            LedgerPhase::Staging
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountRole, Transfer};
    use rstest::{fixture, rstest};
    use std::sync::Arc;
    use std::thread;

    fn transaction(transfers: &[(AccountId, AccountId, Balance)]) -> Transaction {
        transfers
            .iter()
            .map(|&(from, to, amount)| Transfer::new(from, to, amount))
            .collect()
    }

    fn balances(entries: &[(AccountId, Balance)]) -> BTreeMap<AccountId, Balance> {
        entries.iter().copied().collect()
    }

    #[fixture]
    fn ledger() -> Ledger {
        Ledger::new([
            AccountBalance::new(1, 5),
            AccountBalance::new(2, 10),
            AccountBalance::new(3, 15),
        ])
    }

    #[test]
    fn test_new_applies_overwrite_rule() {
        let ledger = Ledger::new([
            AccountBalance::new(1, 5),
            AccountBalance::new(1, 50),
            AccountBalance::new(2, 0),
        ]);

        assert_eq!(ledger.balances(), balances(&[(1, 50), (2, 0)]));
        assert!(ledger.applied_transactions().is_empty());
        assert_eq!(ledger.phase(), LedgerPhase::Empty);
    }

    #[rstest]
    fn test_phase_follows_the_cycle(ledger: Ledger) {
        assert_eq!(ledger.phase(), LedgerPhase::Empty);

        ledger.stage_transaction(&transaction(&[(1, 2, 1)])).unwrap();
        assert_eq!(ledger.phase(), LedgerPhase::Staging);

        ledger.settling.store(true, Ordering::Release);
        assert_eq!(ledger.phase(), LedgerPhase::Settling);
        ledger.settling.store(false, Ordering::Release);

        ledger.settle().unwrap();
        assert_eq!(ledger.phase(), LedgerPhase::Empty);
    }

    #[rstest]
    fn test_single_transaction_settles(ledger: Ledger) {
        let tx = ledger
            .stage_transaction(&transaction(&[(1, 2, 3), (3, 1, 2)]))
            .unwrap();
        assert_eq!(tx, 1);

        let report = ledger.settle().unwrap();

        assert_eq!(ledger.balances(), balances(&[(1, 4), (2, 13), (3, 13)]));
        assert_eq!(ledger.applied_transactions(), vec![1]);
        assert_eq!(report.applied, vec![1]);
        assert!(report.rejected.is_empty());
    }

    #[rstest]
    fn test_invalid_middle_transaction_is_excluded(ledger: Ledger) {
        ledger.stage_transaction(&transaction(&[(2, 1, 11)])).unwrap();
        ledger.stage_transaction(&transaction(&[(2, 3, 5)])).unwrap();
        ledger
            .stage_transaction(&transaction(&[(1, 2, 3), (3, 1, 2)]))
            .unwrap();

        let report = ledger.settle().unwrap();

        assert_eq!(report.applied, vec![1, 3]);
        assert_eq!(report.rejected, vec![2]);
        assert_eq!(ledger.balances(), balances(&[(1, 15), (2, 2), (3, 13)]));
    }

    #[rstest]
    fn test_exclusion_is_enforced_on_every_touched_account(ledger: Ledger) {
        // tx 2 is valid for account 3 but drives account 2 negative
        ledger.stage_transaction(&transaction(&[(2, 1, 11)])).unwrap();
        ledger
            .stage_transaction(&transaction(&[(2, 3, 5), (3, 1, 2)]))
            .unwrap();
        ledger
            .stage_transaction(&transaction(&[(1, 2, 3), (3, 1, 2)]))
            .unwrap();

        ledger.settle().unwrap();

        assert_eq!(ledger.applied_transactions(), vec![1, 3]);
        assert_eq!(ledger.balances(), balances(&[(1, 15), (2, 2), (3, 13)]));
    }

    #[rstest]
    fn test_self_transfer_pending_against_overdraft(ledger: Ledger) {
        // Account 1 is overdrawn by tx 1; the later self-transfer nets to zero
        // and survives, the debit is the one excluded.
        ledger.stage_transaction(&transaction(&[(1, 2, 6)])).unwrap();
        ledger.stage_transaction(&transaction(&[(1, 1, 1)])).unwrap();

        let report = ledger.settle().unwrap();

        assert_eq!(report.applied, vec![2]);
        assert_eq!(report.rejected, vec![1]);
        assert_eq!(ledger.balances(), balances(&[(1, 5), (2, 10), (3, 15)]));
    }

    #[test]
    fn test_cascading_exclusion() {
        let ledger = Ledger::new([
            AccountBalance::new(1, 0),
            AccountBalance::new(2, 5),
            AccountBalance::new(3, 0),
        ]);
        ledger.stage_transaction(&transaction(&[(2, 1, 10)])).unwrap();
        ledger.stage_transaction(&transaction(&[(1, 3, 10)])).unwrap();

        let report = ledger.settle().unwrap();

        assert!(report.applied.is_empty());
        assert_eq!(report.rejected, vec![1, 2]);
        assert_eq!(ledger.balances(), balances(&[(1, 0), (2, 5), (3, 0)]));
    }

    #[rstest]
    fn test_unknown_account_rejects_whole_transaction(ledger: Ledger) {
        ledger.stage_transaction(&transaction(&[(1, 2, 3)])).unwrap();

        let result = ledger.stage_transaction(&transaction(&[(2, 3, 1), (3, 9, 1)]));
        assert_eq!(
            result,
            Err(LedgerError::unknown_account(2, 9, AccountRole::Destination))
        );

        ledger.stage_transaction(&transaction(&[(3, 2, 1)])).unwrap();
        ledger.settle().unwrap();

        assert_eq!(ledger.applied_transactions(), vec![1, 3]);
        assert_eq!(ledger.balances(), balances(&[(1, 2), (2, 14), (3, 14)]));
    }

    #[rstest]
    fn test_counter_advances_on_rejection(ledger: Ledger) {
        assert!(ledger.stage_transaction(&Transaction::default()).is_err());
        assert_eq!(ledger.pending_transactions(), 1);
        assert_eq!(ledger.phase(), LedgerPhase::Staging);

        let tx = ledger.stage_transaction(&transaction(&[(1, 2, 1)])).unwrap();
        assert_eq!(tx, 2);
    }

    #[rstest]
    fn test_settle_without_staging_fails(ledger: Ledger) {
        assert_eq!(ledger.settle(), Err(LedgerError::NothingToSettle));
        assert_eq!(ledger.balances(), balances(&[(1, 5), (2, 10), (3, 15)]));
    }

    #[rstest]
    fn test_second_settle_is_nothing_to_settle(ledger: Ledger) {
        ledger.stage_transaction(&transaction(&[(1, 2, 3)])).unwrap();
        ledger.settle().unwrap();
        let settled = ledger.balances();

        assert_eq!(ledger.settle(), Err(LedgerError::NothingToSettle));
        assert_eq!(ledger.balances(), settled);
        assert_eq!(ledger.applied_transactions(), vec![1]);
    }

    #[rstest]
    fn test_settle_clears_counter_after_rejected_staging(ledger: Ledger) {
        assert!(ledger
            .stage_transaction(&transaction(&[(1, 42, 1)]))
            .is_err());

        assert_eq!(ledger.settle(), Err(LedgerError::NothingToSettle));
        assert_eq!(ledger.phase(), LedgerPhase::Empty);
        assert_eq!(ledger.stage_transaction(&transaction(&[(1, 2, 1)])), Ok(1));
    }

    #[rstest]
    fn test_ids_restart_after_settlement(ledger: Ledger) {
        ledger.stage_transaction(&transaction(&[(1, 2, 1)])).unwrap();
        ledger.stage_transaction(&transaction(&[(1, 2, 1)])).unwrap();
        ledger.settle().unwrap();

        assert_eq!(ledger.phase(), LedgerPhase::Empty);
        assert_eq!(ledger.stage_transaction(&transaction(&[(2, 1, 1)])), Ok(1));
        ledger.settle().unwrap();

        assert_eq!(ledger.applied_transactions(), vec![1]);
        assert_eq!(ledger.balances(), balances(&[(1, 4), (2, 11), (3, 15)]));
    }

    #[rstest]
    fn test_next_cycle_uses_settled_balances(ledger: Ledger) {
        ledger.stage_transaction(&transaction(&[(1, 2, 5)])).unwrap();
        ledger.settle().unwrap();

        // Account 1 is now empty, so a further debit is excluded
        ledger.stage_transaction(&transaction(&[(1, 3, 1)])).unwrap();
        let report = ledger.settle().unwrap();

        assert_eq!(report.rejected, vec![1]);
        assert!(ledger.applied_transactions().is_empty());
        assert_eq!(ledger.balance(1), Some(0));
    }

    #[test]
    fn test_settlement_overflow_commits_nothing() {
        let ledger = Ledger::new([
            AccountBalance::new(1, Balance::MAX),
            AccountBalance::new(2, Balance::MAX),
        ]);
        ledger.stage_transaction(&transaction(&[(2, 1, 1)])).unwrap();

        let result = ledger.settle();

        assert_eq!(result, Err(LedgerError::arithmetic_overflow("settle", 1)));
        assert_eq!(ledger.balance(1), Some(Balance::MAX));
        assert_eq!(ledger.balance(2), Some(Balance::MAX));
        assert_eq!(ledger.phase(), LedgerPhase::Empty);
    }

    #[test]
    fn test_concurrent_staging_assigns_distinct_ids() {
        let ledger = Arc::new(Ledger::new(
            (1..=8).map(|account| AccountBalance::new(account, 1_000)),
        ));

        let handles: Vec<_> = (1..=8u32)
            .map(|account| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    let to = account % 8 + 1;
                    (0..50)
                        .map(|_| {
                            ledger
                                .stage_transaction(&transaction(&[(account, to, 1)]))
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<TransactionId> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        ids.sort_unstable();

        assert_eq!(ids, (1..=400).collect::<Vec<_>>());

        let report = ledger.settle().unwrap();
        assert_eq!(report.applied.len(), 400);
        // Every account sends 50 and receives 50
        assert!(ledger.balances().values().all(|&balance| balance == 1_000));
    }

    #[test]
    fn test_reads_during_staging_see_committed_state() {
        let ledger = Arc::new(Ledger::new([
            AccountBalance::new(1, 100),
            AccountBalance::new(2, 0),
        ]));

        let writer = {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..100 {
                    ledger
                        .stage_transaction(&transaction(&[(1, 2, 1)]))
                        .unwrap();
                }
            })
        };

        for _ in 0..100 {
            assert_eq!(ledger.balances(), balances(&[(1, 100), (2, 0)]));
        }
        writer.join().unwrap();

        ledger.settle().unwrap();
        assert_eq!(ledger.balances(), balances(&[(1, 0), (2, 100)]));
    }
}
