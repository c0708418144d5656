//! Report options read from the snapshot document.

use ledgerbook_core::{AccountId, Snapshot};
use std::collections::{HashMap, HashSet};

/// Known option names.
const KNOWN_OPTIONS: &[&str] = &[
    "title",
    "fiscal_year",
    "payables_account",
    "cash_accounts",
    "revenue_accounts",
    "decimal_places",
];

/// Options that can be specified multiple times.
const REPEATABLE_OPTIONS: &[&str] = &["cash_accounts", "revenue_accounts"];

/// Largest scale a `Decimal` can carry.
const MAX_DECIMAL_PLACES: u32 = 28;

/// Option validation warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionWarning {
    /// Warning code (E7001, E7002, E7003).
    pub code: &'static str,
    /// Warning message.
    pub message: String,
    /// Option name.
    pub option: String,
    /// Option value.
    pub value: String,
}

/// Report options.
///
/// Account references are account *numbers*, the identifier bookkeepers
/// actually see; they are resolved against a snapshot on demand.
#[derive(Debug, Clone)]
pub struct Options {
    /// Title printed above reports.
    pub title: Option<String>,

    /// Year for the monthly series.
    pub fiscal_year: Option<i32>,

    /// Number of the account reconciled by the open-item report.
    pub payables_account: Option<String>,

    /// Numbers of the accounts whose cash flow is reported.
    pub cash_accounts: Vec<String>,

    /// Numbers of the accounts whose revenue is reported.
    pub revenue_accounts: Vec<String>,

    /// Rounding applied to printed amounts.
    pub decimal_places: u32,

    /// Any other custom options.
    pub custom: HashMap<String, String>,

    /// Options that have been set (for duplicate detection).
    #[doc(hidden)]
    pub set_options: HashSet<String>,

    /// Validation warnings collected while setting options.
    pub warnings: Vec<OptionWarning>,
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

impl Options {
    /// Create new options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: None,
            fiscal_year: None,
            payables_account: None,
            cash_accounts: Vec::new(),
            revenue_accounts: Vec::new(),
            decimal_places: 2,
            custom: HashMap::new(),
            set_options: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Set an option by name.
    ///
    /// Validates the option and collects any warnings in `self.warnings`.
    /// An invalid value leaves the previous value in place.
    pub fn set(&mut self, key: &str, value: &str) {
        // Check for unknown options (E7001)
        let is_known = KNOWN_OPTIONS.contains(&key);
        if !is_known {
            self.warn("E7001", format!("Unknown option \"{key}\""), key, value);
        }

        // Check for duplicate non-repeatable options (E7003)
        let is_repeatable = REPEATABLE_OPTIONS.contains(&key);
        if is_known && !is_repeatable && self.set_options.contains(key) {
            self.warn(
                "E7003",
                format!("Option \"{key}\" can only be specified once"),
                key,
                value,
            );
        }

        self.set_options.insert(key.to_string());

        let value = value.trim();
        match key {
            "title" => self.title = Some(value.to_string()),
            "fiscal_year" => match value.parse::<i32>() {
                Ok(year) if (1..=9999).contains(&year) => self.fiscal_year = Some(year),
                _ => self.invalid(key, value, "a year between 1 and 9999"),
            },
            "payables_account" => {
                if value.is_empty() {
                    self.invalid(key, value, "an account number");
                } else {
                    self.payables_account = Some(value.to_string());
                }
            }
            "cash_accounts" | "revenue_accounts" => {
                if value.is_empty() {
                    self.invalid(key, value, "an account number");
                } else if key == "cash_accounts" {
                    self.cash_accounts.push(value.to_string());
                } else {
                    self.revenue_accounts.push(value.to_string());
                }
            }
            "decimal_places" => match value.parse::<u32>() {
                Ok(n) if n <= MAX_DECIMAL_PLACES => self.decimal_places = n,
                _ => self.invalid(key, value, "an integer between 0 and 28"),
            },
            _ => {
                // Unknown options go to custom map
                self.custom.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// Reset an option to its default so it can be set again without a
    /// duplicate warning. Used for command-line overrides.
    pub fn clear(&mut self, key: &str) {
        let defaults = Self::new();
        match key {
            "title" => self.title = defaults.title,
            "fiscal_year" => self.fiscal_year = defaults.fiscal_year,
            "payables_account" => self.payables_account = defaults.payables_account,
            "cash_accounts" => self.cash_accounts.clear(),
            "revenue_accounts" => self.revenue_accounts.clear(),
            "decimal_places" => self.decimal_places = defaults.decimal_places,
            _ => {
                self.custom.remove(key);
            }
        }
        self.set_options.remove(key);
    }

    /// Get a custom option value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.custom.get(key).map(String::as_str)
    }

    /// Resolve the configured payables account against `snapshot`.
    #[must_use]
    pub fn payables_account_id(&self, snapshot: &Snapshot) -> Option<AccountId> {
        let number = self.payables_account.as_deref()?;
        snapshot.account_by_number(number).map(|a| a.id.clone())
    }

    /// Resolve the configured cash accounts against `snapshot`.
    #[must_use]
    pub fn cash_account_ids(&self, snapshot: &Snapshot) -> HashSet<AccountId> {
        resolve_numbers(&self.cash_accounts, snapshot)
    }

    /// Resolve the configured revenue accounts against `snapshot`.
    #[must_use]
    pub fn revenue_account_ids(&self, snapshot: &Snapshot) -> HashSet<AccountId> {
        resolve_numbers(&self.revenue_accounts, snapshot)
    }

    /// Warn (E7002) about account numbers that match no account in `snapshot`.
    pub fn check_accounts(&mut self, snapshot: &Snapshot) {
        let mut missing = Vec::new();
        if let Some(number) = &self.payables_account {
            missing.push(("payables_account", number.clone()));
        }
        missing.extend(self.cash_accounts.iter().map(|n| ("cash_accounts", n.clone())));
        missing.extend(self.revenue_accounts.iter().map(|n| ("revenue_accounts", n.clone())));

        for (key, number) in missing {
            if snapshot.account_by_number(&number).is_none() {
                self.warn(
                    "E7002",
                    format!("Option \"{key}\" names account number \"{number}\", which does not exist"),
                    key,
                    &number,
                );
            }
        }
    }

    fn invalid(&mut self, key: &str, value: &str, expected: &str) {
        self.warn(
            "E7002",
            format!("Invalid value \"{value}\" for option \"{key}\": expected {expected}"),
            key,
            value,
        );
    }

    fn warn(&mut self, code: &'static str, message: String, key: &str, value: &str) {
        tracing::debug!(code, option = key, value, "{message}");
        self.warnings.push(OptionWarning {
            code,
            message,
            option: key.to_string(),
            value: value.to_string(),
        });
    }
}

fn resolve_numbers(numbers: &[String], snapshot: &Snapshot) -> HashSet<AccountId> {
    numbers
        .iter()
        .filter_map(|number| snapshot.account_by_number(number))
        .map(|account| account.id.clone())
        .collect()
}
