//! Ledger aggregation engine.
//!
//! This crate turns a chart of accounts and a flat list of double-entry
//! transactions into derived views:
//!
//! - [`compute_balances`] - Signed balance per account
//! - [`build_hierarchy`] - Ordered account/group tree with roll-ups
//! - [`aggregate_monthly`] - Twelve monthly buckets for a set of accounts
//! - [`reconcile`] - Balance and open items of one account at a cutoff
//!
//! Every function is pure: it borrows its inputs, allocates its output and
//! keeps no state between calls. Calling it twice with the same snapshot
//! yields the same result. References to unknown accounts or groups are
//! skipped record by record rather than failing the whole computation.
//!
//! # Example
//!
//! ```
//! use ledgerbook_core::{Account, AccountGroup, AccountType, NaiveDate, Snapshot, Transaction};
//! use ledgerbook_engine::LedgerView;
//! use rust_decimal_macros::dec;
//!
//! let snapshot = Snapshot::new()
//!     .with_group(AccountGroup::new("g1", "1", "Assets"))
//!     .with_account(Account::new("bank", "1200", "Bank", AccountType::Asset).with_group("g1"))
//!     .with_account(Account::new("sales", "8400", "Sales", AccountType::Revenue))
//!     .with_transaction(Transaction::new(
//!         "t1",
//!         NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
//!         dec!(100),
//!         "bank",
//!         "sales",
//!     ));
//!
//! let view = LedgerView::new(&snapshot);
//! assert_eq!(view.balances()["sales"], dec!(100));
//! assert_eq!(view.hierarchy().unwrap().roots().count(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod balances;
pub mod hierarchy;
pub mod open_items;
pub mod series;

pub use balances::{
    compute_balances, compute_balances_with_diagnostics, credit_effect, debit_effect, side_effect,
    BalanceMap, BalanceReport, SkipDiagnostics,
};
pub use hierarchy::{
    build_hierarchy, collate, AccountNode, AccountTree, HierarchyError, NodeId, NodeIndex,
    NodeKind,
};
pub use open_items::{
    reconcile, reconcile_with, AmountMatcher, OpenItem, Reconciliation, SettlementStrategy,
};
pub use series::{
    aggregate_monthly, monthly_cash_flow, monthly_revenue, year_bounds, AggregationMode,
    CashFlowBucket, MonthlySeries, RevenueBucket, SeriesError,
};

use chrono::NaiveDate;
use ledgerbook_core::{AccountId, Snapshot};
use std::collections::HashSet;

/// Borrowed access to every aggregation over one [`Snapshot`].
///
/// The view holds nothing but the reference; each method recomputes.
#[derive(Debug, Clone, Copy)]
pub struct LedgerView<'a> {
    snapshot: &'a Snapshot,
}

impl<'a> LedgerView<'a> {
    /// Create a view over `snapshot`.
    #[must_use]
    pub const fn new(snapshot: &'a Snapshot) -> Self {
        Self { snapshot }
    }

    /// The underlying snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &'a Snapshot {
        self.snapshot
    }

    /// See [`compute_balances`].
    #[must_use]
    pub fn balances(&self) -> BalanceMap {
        compute_balances(&self.snapshot.accounts, &self.snapshot.transactions)
    }

    /// See [`compute_balances_with_diagnostics`].
    #[must_use]
    pub fn balance_report(&self) -> BalanceReport {
        compute_balances_with_diagnostics(&self.snapshot.accounts, &self.snapshot.transactions)
    }

    /// See [`build_hierarchy`].
    pub fn hierarchy(&self) -> Result<AccountTree, HierarchyError> {
        build_hierarchy(&self.snapshot.accounts, &self.snapshot.groups)
    }

    /// See [`aggregate_monthly`].
    pub fn monthly(
        &self,
        year: i32,
        selected: &HashSet<AccountId>,
        mode: AggregationMode,
    ) -> Result<MonthlySeries, SeriesError> {
        aggregate_monthly(year, selected, &self.snapshot.transactions, mode)
    }

    /// See [`reconcile`].
    #[must_use]
    pub fn reconcile(&self, account: &AccountId, cutoff: NaiveDate) -> Reconciliation {
        reconcile(account, cutoff, &self.snapshot.transactions)
    }
}
