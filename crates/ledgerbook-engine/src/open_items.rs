//! Open-item reconciliation for a single liability-style account.
//!
//! Every credit posting to the target account (an incoming invoice on a
//! payables account, say) is an *item*. An item is *settled* when a debit
//! posting to the same account (a payment) can be paired with it. How items
//! and payments are paired is decided by a [`SettlementStrategy`];
//! [`AmountMatcher`] is the built-in one.
//!
//! # Example
//!
//! ```
//! use ledgerbook_core::{NaiveDate, Transaction};
//! use ledgerbook_engine::reconcile;
//! use rust_decimal_macros::dec;
//!
//! let d = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let txs = vec![
//!     Transaction::new("inv1", d, dec!(100), "rent", "payables"),
//!     Transaction::new("inv2", d, dec!(100), "rent", "payables"),
//!     Transaction::new("inv3", d, dec!(200), "office", "payables"),
//!     Transaction::new("pay1", d, dec!(100), "payables", "bank"),
//! ];
//!
//! let result = reconcile(&"payables".into(), d, &txs);
//! assert_eq!(result.balance, dec!(300));
//! assert_eq!(result.open_item_count, 2);
//! ```

use chrono::NaiveDate;
use ledgerbook_core::{AccountId, Transaction, TransactionId};
use rust_decimal::Decimal;
use serde::Serialize;

/// Pairs items (credit postings) with payments (debit postings).
pub trait SettlementStrategy {
    /// Positions in `items` that remain unsettled, ascending.
    ///
    /// Both slices are in booking order (date, then snapshot order) and only
    /// contain postings to the reconciled account.
    fn open_items(&self, items: &[&Transaction], payments: &[&Transaction]) -> Vec<usize>;
}

/// Amount-only, first-match heuristic.
///
/// Each item takes the first unused payment of exactly the same amount whose
/// credit account differs from the item's debit account, which keeps a
/// booking and its own reversal from cancelling out. A payment settles at
/// most one item.
///
/// This is an approximation. It ignores partial payments and, when several
/// items share an amount, pairs them in booking order regardless of which
/// invoice a payment was meant for.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmountMatcher;

impl SettlementStrategy for AmountMatcher {
    fn open_items(&self, items: &[&Transaction], payments: &[&Transaction]) -> Vec<usize> {
        let mut used = vec![false; payments.len()];
        let mut open = Vec::new();

        for (i, item) in items.iter().enumerate() {
            let matched = payments.iter().zip(&used).position(|(payment, &taken)| {
                !taken
                    && payment.amount == item.amount
                    && payment.credit_account_id != item.debit_account_id
            });
            match matched {
                Some(j) => used[j] = true,
                None => open.push(i),
            }
        }

        open
    }
}

/// A credit posting with no matching payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenItem {
    /// The booking that opened the item.
    pub transaction_id: TransactionId,
    /// Booking date.
    pub date: NaiveDate,
    /// Outstanding amount.
    pub amount: Decimal,
    /// The debit account of the booking (e.g. the expense).
    pub counter_account: AccountId,
}

/// Balance and open items of one account as of a cutoff date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// The reconciled account.
    pub account: AccountId,
    /// Cutoff date, inclusive.
    pub as_of: NaiveDate,
    /// Credits minus debits up to the cutoff.
    pub balance: Decimal,
    /// Number of unsettled credit postings.
    pub open_item_count: usize,
    /// The unsettled credit postings, in booking order.
    pub open_items: Vec<OpenItem>,
}

impl Reconciliation {
    /// Sum of open item amounts.
    #[must_use]
    pub fn open_amount(&self) -> Decimal {
        self.open_items.iter().map(|item| item.amount).sum()
    }
}

/// Reconcile `account` as of `cutoff` using [`AmountMatcher`].
#[must_use]
pub fn reconcile(
    account: &AccountId,
    cutoff: NaiveDate,
    transactions: &[Transaction],
) -> Reconciliation {
    reconcile_with(&AmountMatcher, account, cutoff, transactions)
}

/// Reconcile `account` as of `cutoff` with a custom strategy.
///
/// Only transactions dated on or before `cutoff` are considered, for both
/// the balance and the item matching.
pub fn reconcile_with<S>(
    strategy: &S,
    account: &AccountId,
    cutoff: NaiveDate,
    transactions: &[Transaction],
) -> Reconciliation
where
    S: SettlementStrategy + ?Sized,
{
    let mut in_range: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.date <= cutoff && tx.touches(account))
        .collect();
    // Stable: equal dates keep snapshot order.
    in_range.sort_by_key(|tx| tx.date);

    let mut balance = Decimal::ZERO;
    let mut items = Vec::new();
    let mut payments = Vec::new();
    for tx in in_range {
        if &tx.credit_account_id == account {
            balance += tx.amount;
            items.push(tx);
        }
        if &tx.debit_account_id == account {
            balance -= tx.amount;
            payments.push(tx);
        }
    }

    let open_items: Vec<OpenItem> = strategy
        .open_items(&items, &payments)
        .into_iter()
        .filter_map(|i| items.get(i))
        .map(|tx| OpenItem {
            transaction_id: tx.id.clone(),
            date: tx.date,
            amount: tx.amount,
            counter_account: tx.debit_account_id.clone(),
        })
        .collect();

    tracing::debug!(
        account = %account,
        %cutoff,
        items = items.len(),
        payments = payments.len(),
        open = open_items.len(),
        "reconciled open items"
    );

    Reconciliation {
        account: account.clone(),
        as_of: cutoff,
        balance,
        open_item_count: open_items.len(),
        open_items,
    }
}
