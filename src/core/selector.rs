//! Selection of transactions to discard at settlement
//!
//! Pure functions, free of locking and I/O, that decide which staged
//! transactions must be excluded so settled balances stay non-negative.
//!
//! # Algorithm
//!
//! For a single account, [`select_invalid_transactions`] sums the initial balance
//! and every staged delta. If the result is negative it walks the transaction ids
//! from the most recent to the oldest, excluding every transaction with a
//! negative delta, until the excluded debits cover the shortfall. Credits are
//! never excluded. The scan is greedy: it neither minimises the number of
//! exclusions nor targets the transaction that caused the shortfall.
//!
//! [`resolve_exclusions`] applies the per-account selection to every account and
//! unions the results, so a transaction excluded on one account is excluded on all
//! of them. Excluding a transaction can remove a credit another account relied on;
//! in that case further rounds run over the surviving deltas until nothing new is
//! excluded.

use crate::types::{Balance, TransactionId};
use std::collections::{BTreeMap, BTreeSet};

/// Transaction ids to exclude for one account
///
/// Arithmetic is carried out in `i128`, so no combination of `i64` deltas can
/// overflow here.
pub fn select_invalid_transactions(
    initial_balance: Balance,
    deltas: &BTreeMap<TransactionId, Balance>,
) -> BTreeSet<TransactionId> {
    let mut invalid = BTreeSet::new();

    let final_balance = deltas
        .values()
        .fold(initial_balance as i128, |sum, &delta| sum + delta as i128);
    if final_balance >= 0 {
        return invalid;
    }

    let mut running = final_balance;
    for (&tx, &delta) in deltas.iter().rev() {
        if delta < 0 {
            invalid.insert(tx);
            running -= delta as i128;
            if running >= 0 {
                break;
            }
        }
    }

    invalid
}

/// Exclusion set across all staged accounts
///
/// Each entry is one account's initial balance and its staged deltas. Every round
/// evaluates all accounts against the union produced by the previous round, so
/// the result does not depend on the order of `accounts`.
pub fn resolve_exclusions(
    accounts: &[(Balance, &BTreeMap<TransactionId, Balance>)],
) -> BTreeSet<TransactionId> {
    let mut excluded: BTreeSet<TransactionId> = BTreeSet::new();

    loop {
        let mut found = BTreeSet::new();

        for &(initial_balance, deltas) in accounts {
            let surviving: BTreeMap<TransactionId, Balance> = deltas
                .iter()
                .filter(|(tx, _)| !excluded.contains(tx))
                .map(|(&tx, &delta)| (tx, delta))
                .collect();

            found.extend(select_invalid_transactions(initial_balance, &surviving));
        }

        let before = excluded.len();
        excluded.extend(found);
        if excluded.len() == before {
            return excluded;
        }
    }
}
