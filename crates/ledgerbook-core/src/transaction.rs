//! Double-entry transactions.
//!
//! A [`Transaction`] moves one non-negative amount from a credit account to a
//! debit account. Whether that increases or decreases each side depends on the
//! account types, which are resolved by the engine, not here.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, Side, TransactionId};

/// An atomic double-entry posting between two accounts.
///
/// # Examples
///
/// ```
/// use ledgerbook_core::{NaiveDate, Transaction};
/// use rust_decimal_macros::dec;
///
/// let tx = Transaction::new(
///     "t1",
///     NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
///     dec!(100.00),
///     "bank",
///     "sales",
/// )
/// .with_description("Invoice 17");
///
/// assert!(tx.touches(&"bank".into()));
/// assert_eq!(tx.description.as_deref(), Some("Invoice 17"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Opaque store key.
    pub id: TransactionId,
    /// Booking date.
    pub date: NaiveDate,
    /// Posted amount. Expected to be non-negative.
    pub amount: Decimal,
    /// Account on the debit side.
    pub debit_account_id: AccountId,
    /// Account on the credit side.
    pub credit_account_id: AccountId,
    /// Free-text booking description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Transaction {
    /// Create a new transaction.
    #[must_use]
    pub fn new(
        id: impl Into<TransactionId>,
        date: NaiveDate,
        amount: Decimal,
        debit_account_id: impl Into<AccountId>,
        credit_account_id: impl Into<AccountId>,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            amount,
            debit_account_id: debit_account_id.into(),
            credit_account_id: credit_account_id.into(),
            description: None,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The account on the given side.
    #[must_use]
    pub const fn account(&self, side: Side) -> &AccountId {
        match side {
            Side::Debit => &self.debit_account_id,
            Side::Credit => &self.credit_account_id,
        }
    }

    /// Whether either side posts to `account`.
    #[must_use]
    pub fn touches(&self, account: &AccountId) -> bool {
        &self.debit_account_id == account || &self.credit_account_id == account
    }

    /// Whether the booking date lies in `start..=end`.
    #[must_use]
    pub fn is_within(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.date && self.date <= end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_account_by_side() {
        let tx = Transaction::new("t1", date(2024, 1, 1), dec!(10), "a", "b");
        assert_eq!(tx.account(Side::Debit), &AccountId::new("a"));
        assert_eq!(tx.account(Side::Credit), &AccountId::new("b"));
        assert!(tx.touches(&"b".into()));
        assert!(!tx.touches(&"c".into()));
    }

    #[test]
    fn test_is_within_is_inclusive() {
        let tx = Transaction::new("t1", date(2024, 12, 31), dec!(1), "a", "b");
        assert!(tx.is_within(date(2024, 1, 1), date(2024, 12, 31)));
        assert!(!tx.is_within(date(2025, 1, 1), date(2025, 12, 31)));
    }

    #[test]
    fn test_amount_accepts_numbers_and_strings() {
        let json = r#"{"id":"t1","date":"2024-03-05","amount":"12.50",
            "debit_account_id":"a","credit_account_id":"b"}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.amount, dec!(12.50));

        let json = r#"{"id":"t2","date":"2024-03-05","amount":7,
            "debit_account_id":"a","credit_account_id":"b"}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.amount, dec!(7));
        assert_eq!(tx.description, None);
    }
}
