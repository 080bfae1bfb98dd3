//! Account-related types for the settlement ledger
//!
//! Accounts are plain integer ids with a single signed committed balance.
//! The ledger is bootstrapped from an ordered list of [`AccountBalance`] entries.

use serde::Deserialize;

/// Account identifier
pub type AccountId = u32;

/// Signed balance (and transfer amount) in minor units
pub type Balance = i64;

/// Initial balance entry used to provision the ledger
///
/// When the same account appears more than once in the provisioning list,
/// the later entry overwrites the earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AccountBalance {
    /// The account being provisioned
    pub account: AccountId,

    /// Its committed balance before any settlement
    pub balance: Balance,
}

impl AccountBalance {
    pub fn new(account: AccountId, balance: Balance) -> Self {
        AccountBalance { account, balance }
    }
}

impl From<(AccountId, Balance)> for AccountBalance {
    fn from((account, balance): (AccountId, Balance)) -> Self {
        AccountBalance::new(account, balance)
    }
}
