//! Chart-of-accounts types.
//!
//! An [`Account`] is a leaf of the chart of accounts; it carries an
//! [`AccountType`] which decides on which side of a posting it naturally
//! accumulates value. An [`AccountGroup`] is an interior node used only for
//! reporting and roll-ups; groups may nest through `parent_id`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{AccountId, GroupId};

/// The side of a double-entry posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Left side of the posting.
    Debit,
    /// Right side of the posting.
    Credit,
}

/// The five account classes of the chart of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Things owned (bank, receivables). Debit-normal.
    #[serde(alias = "assets")]
    Asset,
    /// Things owed (payables, loans). Credit-normal.
    #[serde(alias = "liabilities")]
    Liability,
    /// Owner's stake. Credit-normal.
    Equity,
    /// Income earned. Credit-normal.
    #[serde(alias = "income")]
    Revenue,
    /// Costs incurred. Debit-normal.
    #[serde(alias = "expenses")]
    Expense,
}

impl AccountType {
    /// All account types in chart-of-accounts order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// The side on which this account type accumulates value.
    ///
    /// ```
    /// use ledgerbook_core::{AccountType, Side};
    ///
    /// assert_eq!(AccountType::Asset.normal_side(), Side::Debit);
    /// assert_eq!(AccountType::Equity.normal_side(), Side::Credit);
    /// ```
    #[must_use]
    pub const fn normal_side(self) -> Side {
        match self {
            Self::Asset | Self::Expense => Side::Debit,
            Self::Liability | Self::Equity | Self::Revenue => Side::Credit,
        }
    }

    /// Whether a debit posting increases this account's balance.
    #[must_use]
    pub const fn is_debit_normal(self) -> bool {
        matches!(self.normal_side(), Side::Debit)
    }

    /// Lowercase name, as used in snapshots.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an account type name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown account type \"{0}\"")]
pub struct ParseAccountTypeError(pub String);

impl FromStr for AccountType {
    type Err = ParseAccountTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asset" | "assets" => Ok(Self::Asset),
            "liability" | "liabilities" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "revenue" | "income" => Ok(Self::Revenue),
            "expense" | "expenses" => Ok(Self::Expense),
            _ => Err(ParseAccountTypeError(s.to_string())),
        }
    }
}

/// An account in the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Opaque store key.
    pub id: AccountId,
    /// Account number, e.g. "1200". Unique and sortable.
    pub number: String,
    /// Display name.
    pub name: String,
    /// Account class.
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Enclosing group, if any.
    #[serde(default)]
    pub group_id: Option<GroupId>,
}

impl Account {
    /// Create a new ungrouped account.
    #[must_use]
    pub fn new(
        id: impl Into<AccountId>,
        number: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            name: name.into(),
            account_type,
            group_id: None,
        }
    }

    /// Place the account in a group.
    #[must_use]
    pub fn with_group(mut self, group_id: impl Into<GroupId>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }
}

/// A reporting group of accounts (or of other groups).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountGroup {
    /// Opaque store key.
    pub id: GroupId,
    /// Group number, e.g. "1". Sortable.
    pub number: String,
    /// Display name.
    pub name: String,
    /// Enclosing group, if any.
    #[serde(default)]
    pub parent_id: Option<GroupId>,
}

impl AccountGroup {
    /// Create a new top-level group.
    #[must_use]
    pub fn new(id: impl Into<GroupId>, number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            name: name.into(),
            parent_id: None,
        }
    }

    /// Nest the group under a parent group.
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<GroupId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}
