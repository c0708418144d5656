//! Core types for ledgerbook
//!
//! This crate provides the chart-of-accounts model consumed by the
//! aggregation engine:
//!
//! - [`Account`] - A leaf account with an [`AccountType`]
//! - [`AccountGroup`] - A reporting group, optionally nested
//! - [`Transaction`] - A double-entry posting between two accounts
//! - [`Snapshot`] - An immutable bundle of all three, tagged with a version
//!
//! The types here carry no logic beyond construction and lookups.
//!
//! # Example
//!
//! ```
//! use ledgerbook_core::{Account, AccountType, NaiveDate, Snapshot, Transaction};
//! use rust_decimal_macros::dec;
//!
//! let snapshot = Snapshot::new()
//!     .with_account(Account::new("bank", "1200", "Bank", AccountType::Asset))
//!     .with_account(Account::new("sales", "8400", "Sales", AccountType::Revenue))
//!     .with_transaction(Transaction::new(
//!         "t1",
//!         NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
//!         dec!(100),
//!         "bank",
//!         "sales",
//!     ));
//!
//! assert_eq!(snapshot.account_types().len(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account;
pub mod id;
pub mod snapshot;
pub mod transaction;

pub use account::{Account, AccountGroup, AccountType, ParseAccountTypeError, Side};
pub use id::{AccountId, GroupId, TransactionId};
pub use snapshot::{account_types, Snapshot};
pub use transaction::Transaction;

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
