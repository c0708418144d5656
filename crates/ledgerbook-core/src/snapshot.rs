//! Immutable input snapshots.
//!
//! The engine never fetches data. Callers resolve accounts, groups and
//! transactions from their store into a [`Snapshot`] and pass it by
//! reference. The `version` field identifies the snapshot so that callers can
//! memoize derived views; the engine itself keeps no cache.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{Account, AccountGroup, AccountId, AccountType, Transaction};

/// A resolved, immutable view of the ledger at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Caller-assigned version, bumped whenever any collection changes.
    #[serde(default)]
    pub version: u64,
    /// The chart of accounts.
    #[serde(default)]
    pub accounts: Vec<Account>,
    /// Account groups.
    #[serde(default)]
    pub groups: Vec<AccountGroup>,
    /// All known transactions.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Snapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the snapshot version.
    #[must_use]
    pub const fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Add an account.
    #[must_use]
    pub fn with_account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }

    /// Add a group.
    #[must_use]
    pub fn with_group(mut self, group: AccountGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Add a transaction.
    #[must_use]
    pub fn with_transaction(mut self, transaction: Transaction) -> Self {
        self.transactions.push(transaction);
        self
    }

    /// Build an id to account-type lookup.
    #[must_use]
    pub fn account_types(&self) -> HashMap<&AccountId, AccountType> {
        account_types(&self.accounts)
    }

    /// Find an account by its number.
    #[must_use]
    pub fn account_by_number(&self, number: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.number == number)
    }

    /// Transactions dated in `start..=end`, in snapshot order.
    pub fn transactions_in(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |tx| tx.is_within(start, end))
    }
}

/// Build an id to account-type lookup from a slice of accounts.
///
/// Later duplicates win, matching how a keyed store would overwrite them.
#[must_use]
pub fn account_types(accounts: &[Account]) -> HashMap<&AccountId, AccountType> {
    accounts
        .iter()
        .map(|account| (&account.id, account.account_type))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn sample() -> Snapshot {
        Snapshot::new()
            .with_version(3)
            .with_account(Account::new("a", "1200", "Bank", AccountType::Asset))
            .with_account(Account::new("r", "8400", "Sales", AccountType::Revenue))
            .with_transaction(Transaction::new("t1", date(2023, 12, 31), dec!(5), "a", "r"))
            .with_transaction(Transaction::new("t2", date(2024, 1, 1), dec!(7), "a", "r"))
    }

    #[test]
    fn test_account_types_lookup() {
        let snapshot = sample();
        let types = snapshot.account_types();
        assert_eq!(types.get(&AccountId::new("r")), Some(&AccountType::Revenue));
        assert_eq!(types.len(), 2);
    }

    #[test]
    fn test_account_by_number() {
        let snapshot = sample();
        assert_eq!(snapshot.account_by_number("8400").map(|a| a.name.as_str()), Some("Sales"));
        assert!(snapshot.account_by_number("9999").is_none());
    }

    #[test]
    fn test_transactions_in_range() {
        let snapshot = sample();
        let ids: Vec<&str> = snapshot
            .transactions_in(date(2024, 1, 1), date(2024, 12, 31))
            .map(|tx| tx.id.as_str())
            .collect();
        assert_eq!(ids, vec!["t2"]);
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let snapshot: Snapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot, Snapshot::default());
    }
}
