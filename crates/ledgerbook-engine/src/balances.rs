//! Per-account balances.
//!
//! Balances are signed from the point of view of each account's normal side:
//! a positive balance on an asset means money held, a positive balance on a
//! liability means money owed. Debits increase asset and expense accounts and
//! decrease the others; credits do the opposite.
//!
//! # Example
//!
//! ```
//! use ledgerbook_core::{Account, AccountType, NaiveDate, Transaction};
//! use ledgerbook_engine::compute_balances;
//! use rust_decimal_macros::dec;
//!
//! let accounts = vec![
//!     Account::new("a", "1200", "Bank", AccountType::Asset),
//!     Account::new("r", "8400", "Sales", AccountType::Revenue),
//! ];
//! let txs = vec![Transaction::new(
//!     "t1",
//!     NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
//!     dec!(100),
//!     "a",
//!     "r",
//! )];
//!
//! let balances = compute_balances(&accounts, &txs);
//! assert_eq!(balances["a"], dec!(100));
//! assert_eq!(balances["r"], dec!(100));
//! ```

use ledgerbook_core::{account_types, Account, AccountId, AccountType, Side, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Mapping from account id to signed balance.
pub type BalanceMap = HashMap<AccountId, Decimal>;

/// Signed effect of a debit of `amount` on an account of type `ty`.
#[must_use]
pub fn debit_effect(ty: AccountType, amount: Decimal) -> Decimal {
    if ty.is_debit_normal() {
        amount
    } else {
        -amount
    }
}

/// Signed effect of a credit of `amount` on an account of type `ty`.
#[must_use]
pub fn credit_effect(ty: AccountType, amount: Decimal) -> Decimal {
    -debit_effect(ty, amount)
}

/// Signed effect of a posting on `side`.
#[must_use]
pub fn side_effect(ty: AccountType, side: Side, amount: Decimal) -> Decimal {
    match side {
        Side::Debit => debit_effect(ty, amount),
        Side::Credit => credit_effect(ty, amount),
    }
}

/// Records that could not be fully applied because an endpoint was unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipDiagnostics {
    /// Transactions whose debit account was not in the account set.
    pub skipped_debits: usize,
    /// Transactions whose credit account was not in the account set.
    pub skipped_credits: usize,
    /// Transactions where neither side resolved.
    pub skipped_transactions: usize,
    /// Distinct unresolved account ids, sorted.
    pub unresolved_accounts: BTreeSet<AccountId>,
}

impl SkipDiagnostics {
    /// Whether every posting was applied.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped_debits == 0 && self.skipped_credits == 0
    }

    /// Number of skipped posting sides.
    #[must_use]
    pub const fn skipped_sides(&self) -> usize {
        self.skipped_debits + self.skipped_credits
    }
}

/// Balances together with skip diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BalanceReport {
    /// Signed balance per known account.
    pub balances: BalanceMap,
    /// What was left out.
    pub skipped: SkipDiagnostics,
}

/// Fold `transactions` into a balance per account.
///
/// Every account in `accounts` appears in the result, starting at zero. A
/// transaction side whose account is not in `accounts` is ignored; the other
/// side is still applied.
#[must_use]
pub fn compute_balances(accounts: &[Account], transactions: &[Transaction]) -> BalanceMap {
    compute_balances_with_diagnostics(accounts, transactions).balances
}

/// Like [`compute_balances`] but also reports which postings were skipped.
#[must_use]
pub fn compute_balances_with_diagnostics(
    accounts: &[Account],
    transactions: &[Transaction],
) -> BalanceReport {
    let types = account_types(accounts);
    let mut balances: BalanceMap = accounts
        .iter()
        .map(|account| (account.id.clone(), Decimal::ZERO))
        .collect();
    let mut skipped = SkipDiagnostics::default();

    for tx in transactions {
        let mut applied = false;

        for side in [Side::Debit, Side::Credit] {
            let account = tx.account(side);
            if let Some(&ty) = types.get(account) {
                *balances.entry(account.clone()).or_default() += side_effect(ty, side, tx.amount);
                applied = true;
                continue;
            }

            tracing::debug!(
                transaction = %tx.id,
                %account,
                ?side,
                "skipping posting side: unknown account"
            );
            match side {
                Side::Debit => skipped.skipped_debits += 1,
                Side::Credit => skipped.skipped_credits += 1,
            }
            skipped.unresolved_accounts.insert(account.clone());
        }

        if !applied {
            skipped.skipped_transactions += 1;
        }
    }

    if !skipped.is_clean() {
        tracing::warn!(
            sides = skipped.skipped_sides(),
            transactions = skipped.skipped_transactions,
            accounts = skipped.unresolved_accounts.len(),
            "balances computed with unresolved account references"
        );
    }

    BalanceReport { balances, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerbook_core::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn chart() -> Vec<Account> {
        vec![
            Account::new("A", "1000", "Cash", AccountType::Asset),
            Account::new("E", "4000", "Rent", AccountType::Expense),
            Account::new("L", "1600", "Payables", AccountType::Liability),
            Account::new("R", "8400", "Sales", AccountType::Revenue),
            Account::new("Q", "0800", "Capital", AccountType::Equity),
        ]
    }

    fn get(balances: &BalanceMap, id: &str) -> Decimal {
        balances[&AccountId::new(id)]
    }

    #[test]
    fn test_all_accounts_start_at_zero() {
        let balances = compute_balances(&chart(), &[]);
        assert_eq!(balances.len(), 5);
        assert!(balances.values().all(Decimal::is_zero));
    }

    #[test]
    fn test_asset_against_revenue() {
        let txs = [Transaction::new("t", date(2024, 1, 1), dec!(100), "A", "R")];
        let balances = compute_balances(&chart(), &txs);
        assert_eq!(get(&balances, "A"), dec!(100));
        assert_eq!(get(&balances, "R"), dec!(100));
    }

    #[test]
    fn test_expense_against_liability() {
        let txs = [Transaction::new("t", date(2024, 1, 1), dec!(50), "E", "L")];
        let balances = compute_balances(&chart(), &txs);
        assert_eq!(get(&balances, "E"), dec!(50));
        assert_eq!(get(&balances, "L"), dec!(50));
    }

    #[test]
    fn test_equity_is_credit_normal() {
        let txs = [
            Transaction::new("t1", date(2024, 1, 1), dec!(1000), "A", "Q"),
            Transaction::new("t2", date(2024, 1, 2), dec!(200), "Q", "A"),
        ];
        let balances = compute_balances(&chart(), &txs);
        assert_eq!(get(&balances, "Q"), dec!(800));
        assert_eq!(get(&balances, "A"), dec!(800));
    }

    #[test]
    fn test_paying_a_liability_reduces_both_sides() {
        let txs = [
            Transaction::new("t1", date(2024, 1, 1), dec!(50), "E", "L"),
            Transaction::new("t2", date(2024, 1, 5), dec!(30), "L", "A"),
        ];
        let balances = compute_balances(&chart(), &txs);
        assert_eq!(get(&balances, "L"), dec!(20));
        assert_eq!(get(&balances, "A"), dec!(-30));
    }

    #[test]
    fn test_unknown_debit_skips_only_that_side() {
        let txs = [Transaction::new("t", date(2024, 1, 1), dec!(40), "X", "R")];
        let report = compute_balances_with_diagnostics(&chart(), &txs);
        assert_eq!(get(&report.balances, "R"), dec!(40));
        assert!(!report.balances.contains_key("X"));
        assert_eq!(report.skipped.skipped_debits, 1);
        assert_eq!(report.skipped.skipped_credits, 0);
        assert_eq!(report.skipped.skipped_transactions, 0);
        assert!(report.skipped.unresolved_accounts.contains("X"));
    }

    #[test]
    fn test_fully_unresolved_transaction_counted() {
        let txs = [
            Transaction::new("t1", date(2024, 1, 1), dec!(1), "X", "Y"),
            Transaction::new("t2", date(2024, 1, 2), dec!(1), "X", "A"),
        ];
        let report = compute_balances_with_diagnostics(&chart(), &txs);
        assert_eq!(report.skipped.skipped_transactions, 1);
        assert_eq!(report.skipped.skipped_sides(), 3);
        let unresolved: Vec<&str> = report
            .skipped
            .unresolved_accounts
            .iter()
            .map(AccountId::as_str)
            .collect();
        assert_eq!(unresolved, vec!["X", "Y"]);
        assert_eq!(get(&report.balances, "A"), dec!(-1));
    }

    #[test]
    fn test_self_transfer_nets_to_zero() {
        let txs = [Transaction::new("t", date(2024, 1, 1), dec!(25), "A", "A")];
        let report = compute_balances_with_diagnostics(&chart(), &txs);
        assert_eq!(get(&report.balances, "A"), Decimal::ZERO);
        assert!(report.skipped.is_clean());
    }

    #[test]
    fn test_effect_helpers() {
        assert_eq!(debit_effect(AccountType::Expense, dec!(3)), dec!(3));
        assert_eq!(debit_effect(AccountType::Revenue, dec!(3)), dec!(-3));
        assert_eq!(credit_effect(AccountType::Liability, dec!(3)), dec!(3));
        assert_eq!(credit_effect(AccountType::Asset, dec!(3)), dec!(-3));
        assert_eq!(side_effect(AccountType::Equity, Side::Credit, dec!(3)), dec!(3));
    }
}
