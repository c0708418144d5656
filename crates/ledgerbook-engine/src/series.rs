//! Monthly time series over one calendar year.
//!
//! Both aggregations produce exactly twelve buckets, January first, whether or
//! not a month saw any activity. Transactions dated outside the year are
//! ignored, so callers may pass an unfiltered transaction list.
//!
//! - [`monthly_cash_flow`]: money flowing into the selected accounts counts as
//!   income (debit side), money flowing out counts as expenses (credit side).
//! - [`monthly_revenue`]: credits to the selected accounts add to the month,
//!   debits (reversals, credit notes) subtract from it.
//!
//! Buckets carry the month number and its first day; turning those into
//! labels is left to the presentation layer.

use chrono::{Datelike, NaiveDate};
use ledgerbook_core::{AccountId, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while bucketing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    /// The year cannot be represented as a calendar date.
    #[error("year {0} is out of the supported date range")]
    YearOutOfRange(i32),

    /// An aggregation mode name was not recognized.
    #[error("unknown aggregation mode \"{0}\" (expected cash-flow or revenue)")]
    UnknownMode(String),
}

/// Sign convention used when bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationMode {
    /// Debits to selected accounts are income, credits are expenses.
    CashFlow,
    /// Credits to selected accounts add, debits subtract.
    Revenue,
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CashFlow => f.write_str("cash-flow"),
            Self::Revenue => f.write_str("revenue"),
        }
    }
}

impl FromStr for AggregationMode {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cash-flow" | "cashflow" | "cash_flow" => Ok(Self::CashFlow),
            "revenue" => Ok(Self::Revenue),
            _ => Err(SeriesError::UnknownMode(s.to_string())),
        }
    }
}

/// One month of cash-flow totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CashFlowBucket {
    /// Calendar month, 1 to 12.
    pub month: u32,
    /// First day of the month.
    pub start: NaiveDate,
    /// Sum of debits to selected accounts.
    pub income: Decimal,
    /// Sum of credits to selected accounts.
    pub expenses: Decimal,
}

impl CashFlowBucket {
    /// Income minus expenses.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.income - self.expenses
    }
}

/// One month of revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevenueBucket {
    /// Calendar month, 1 to 12.
    pub month: u32,
    /// First day of the month.
    pub start: NaiveDate,
    /// Credits minus debits on selected accounts.
    pub value: Decimal,
}

/// Twelve buckets in one of the two conventions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "months", rename_all = "kebab-case")]
pub enum MonthlySeries {
    /// Output of [`monthly_cash_flow`].
    CashFlow([CashFlowBucket; 12]),
    /// Output of [`monthly_revenue`].
    Revenue([RevenueBucket; 12]),
}

impl MonthlySeries {
    /// The convention these buckets follow.
    #[must_use]
    pub const fn mode(&self) -> AggregationMode {
        match self {
            Self::CashFlow(_) => AggregationMode::CashFlow,
            Self::Revenue(_) => AggregationMode::Revenue,
        }
    }

    /// Year total: net cash flow, or total revenue.
    #[must_use]
    pub fn total(&self) -> Decimal {
        match self {
            Self::CashFlow(buckets) => buckets.iter().map(CashFlowBucket::net).sum(),
            Self::Revenue(buckets) => buckets.iter().map(|b| b.value).sum(),
        }
    }
}

/// First and last day of `year`.
pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), SeriesError> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(SeriesError::YearOutOfRange(year))?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31).ok_or(SeriesError::YearOutOfRange(year))?;
    Ok((start, end))
}

fn month_starts(year: i32) -> Result<[NaiveDate; 12], SeriesError> {
    let (start, _) = year_bounds(year)?;
    let mut starts = [start; 12];
    for (month, slot) in (1u32..).zip(starts.iter_mut()) {
        *slot = start
            .with_month(month)
            .ok_or(SeriesError::YearOutOfRange(year))?;
    }
    Ok(starts)
}

/// Bucket index of `date` within `year`, if it falls inside it.
fn bucket(year: i32, date: NaiveDate) -> Option<usize> {
    (date.year() == year).then(|| date.month0() as usize)
}

/// Cash-flow series for the `selected` accounts over `year`.
///
/// A transaction between two selected accounts counts as both income and
/// expense in its month.
pub fn monthly_cash_flow(
    year: i32,
    selected: &HashSet<AccountId>,
    transactions: &[Transaction],
) -> Result<[CashFlowBucket; 12], SeriesError> {
    let starts = month_starts(year)?;
    let mut buckets = starts.map(|start| CashFlowBucket {
        month: start.month(),
        start,
        income: Decimal::ZERO,
        expenses: Decimal::ZERO,
    });

    for tx in transactions {
        let Some(i) = bucket(year, tx.date) else {
            continue;
        };
        if selected.contains(&tx.debit_account_id) {
            buckets[i].income += tx.amount;
        }
        if selected.contains(&tx.credit_account_id) {
            buckets[i].expenses += tx.amount;
        }
    }

    Ok(buckets)
}

/// Revenue series for the `selected` accounts over `year`.
pub fn monthly_revenue(
    year: i32,
    selected: &HashSet<AccountId>,
    transactions: &[Transaction],
) -> Result<[RevenueBucket; 12], SeriesError> {
    let starts = month_starts(year)?;
    let mut buckets = starts.map(|start| RevenueBucket {
        month: start.month(),
        start,
        value: Decimal::ZERO,
    });

    for tx in transactions {
        let Some(i) = bucket(year, tx.date) else {
            continue;
        };
        if selected.contains(&tx.credit_account_id) {
            buckets[i].value += tx.amount;
        }
        if selected.contains(&tx.debit_account_id) {
            buckets[i].value -= tx.amount;
        }
    }

    Ok(buckets)
}

/// Dispatch to [`monthly_cash_flow`] or [`monthly_revenue`].
pub fn aggregate_monthly(
    year: i32,
    selected: &HashSet<AccountId>,
    transactions: &[Transaction],
    mode: AggregationMode,
) -> Result<MonthlySeries, SeriesError> {
    tracing::debug!(
        year,
        %mode,
        selected = selected.len(),
        transactions = transactions.len(),
        "aggregating monthly series"
    );
    match mode {
        AggregationMode::CashFlow => {
            monthly_cash_flow(year, selected, transactions).map(MonthlySeries::CashFlow)
        }
        AggregationMode::Revenue => {
            monthly_revenue(year, selected, transactions).map(MonthlySeries::Revenue)
        }
    }
}
