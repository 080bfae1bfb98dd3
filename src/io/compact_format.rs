//! Compact integer scenario encoding
//!
//! A whole scenario (accounts plus transactions) and its outcome can be written
//! as a flat list of integers. The format is used by regression fixtures.
//!
//! # Format
//!
//! ```text
//! input:  n_accounts, (account, balance) × n_accounts,
//!         n_transactions, (n_transfers, (from, to, amount) × n_transfers) × n_transactions
//! output: n_balances, (account, balance) × n_balances,
//!         n_applied, applied ids...
//! ```
//!
//! The output lists one balance per input account entry, in input order, so a
//! duplicated account appears twice with the same settled balance.

use crate::core::Ledger;
use crate::types::{AccountBalance, AccountId, LedgerError, Transaction, Transfer};

/// A decoded scenario
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scenario {
    pub accounts: Vec<AccountBalance>,
    pub transactions: Vec<Transaction>,
}

struct Decoder<'a> {
    values: &'a [i64],
    position: usize,
}

impl<'a> Decoder<'a> {
    fn next(&mut self, what: &str) -> Result<i64, LedgerError> {
        let value = self.values.get(self.position).copied().ok_or_else(|| {
            LedgerError::invalid_encoding(self.position, &format!("missing {}", what))
        })?;
        self.position += 1;
        Ok(value)
    }

    fn count(&mut self, what: &str) -> Result<usize, LedgerError> {
        let position = self.position;
        let value = self.next(what)?;
        usize::try_from(value).map_err(|_| {
            LedgerError::invalid_encoding(position, &format!("negative {} {}", what, value))
        })
    }

    fn account(&mut self, what: &str) -> Result<AccountId, LedgerError> {
        let position = self.position;
        let value = self.next(what)?;
        AccountId::try_from(value).map_err(|_| {
            LedgerError::invalid_encoding(position, &format!("{} {} out of range", what, value))
        })
    }
}

/// Decode a flat integer list into a scenario
///
/// # Errors
///
/// `InvalidEncoding` with the offending position if the list is truncated, a
/// count is negative, an account id does not fit, or values are left over.
pub fn decode_scenario(values: &[i64]) -> Result<Scenario, LedgerError> {
    let mut decoder = Decoder {
        values,
        position: 0,
    };

    let n_accounts = decoder.count("account count")?;
    let mut accounts = Vec::new();
    for _ in 0..n_accounts {
        let account = decoder.account("account")?;
        let balance = decoder.next("balance")?;
        accounts.push(AccountBalance::new(account, balance));
    }

    let n_transactions = decoder.count("transaction count")?;
    let mut transactions = Vec::new();
    for _ in 0..n_transactions {
        let n_transfers = decoder.count("transfer count")?;
        let mut transaction = Transaction::default();
        for _ in 0..n_transfers {
            let from = decoder.account("source account")?;
            let to = decoder.account("destination account")?;
            let amount = decoder.next("amount")?;
            transaction.push(Transfer::new(from, to, amount));
        }
        transactions.push(transaction);
    }

    if decoder.position != values.len() {
        return Err(LedgerError::invalid_encoding(
            decoder.position,
            "trailing values",
        ));
    }

    Ok(Scenario {
        accounts,
        transactions,
    })
}

/// Encode the committed state of `ledger` for the given input accounts
pub fn encode_outcome(accounts: &[AccountBalance], ledger: &Ledger) -> Vec<i64> {
    let applied = ledger.applied_transactions();
    let mut output = Vec::with_capacity(2 + accounts.len() * 2 + applied.len());

    output.push(accounts.len() as i64);
    for entry in accounts {
        output.push(i64::from(entry.account));
        output.push(ledger.balance(entry.account).unwrap_or(entry.balance));
    }

    output.push(applied.len() as i64);
    output.extend(applied.iter().map(|&tx| tx as i64));

    output
}

impl Scenario {
    /// Stage every transaction, settle once and encode the outcome
    ///
    /// Staging rejections are logged and skipped. A scenario with nothing to
    /// settle encodes the initial balances.
    ///
    /// # Errors
    ///
    /// Settlement errors other than `NothingToSettle`.
    pub fn run(&self) -> Result<Vec<i64>, LedgerError> {
        let ledger = Ledger::new(self.accounts.iter().copied());

        for transaction in &self.transactions {
            if let Err(e) = ledger.stage_transaction(transaction) {
                tracing::warn!(error = %e, "transaction rejected at staging");
            }
        }

        match ledger.settle() {
            Ok(_) | Err(LedgerError::NothingToSettle) => {}
            Err(e) => return Err(e),
        }

        Ok(encode_outcome(&self.accounts, &ledger))
    }
}
