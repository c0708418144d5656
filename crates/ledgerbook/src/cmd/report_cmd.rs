//! lb-report - Print derived views of a ledger snapshot.
//!
//! # Usage
//!
//! ```bash
//! lb-report ledger.json balances
//! lb-report ledger.json tree
//! lb-report ledger.json monthly --mode revenue --year 2024
//! lb-report ledger.json open-items --account 3300 --as-of 2024-06-30
//! lb-report ledger.json --format json stats
//! ```
//!
//! # Reports
//!
//! - `balances` - Signed balance per account
//! - `tree` - Account tree with rolled-up group balances
//! - `monthly` - Twelve monthly cash-flow or revenue totals
//! - `open-items` - Balance and unmatched credit postings of one account
//! - `stats` - Snapshot statistics and diagnostics
//!
//! Command-line flags take precedence over the snapshot's `options`.

use crate::format::{format_amount, indent, month_label};
use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use ledgerbook_core::{Account, AccountId, AccountType, Snapshot};
use ledgerbook_engine::{
    collate, AggregationMode, LedgerView, MonthlySeries, NodeKind, SkipDiagnostics,
};
use ledgerbook_loader::{LoadResult, Loader, OptionWarning, Options};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// JSON output for scripts
    Json,
}

/// Print reports from a ledger snapshot.
#[derive(Parser, Debug)]
#[command(name = "lb-report")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The snapshot file to process
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// The report to generate
    #[command(subcommand)]
    pub report: Report,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text or json)
    #[arg(long, short = 'f', value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Decimal places for printed amounts
    #[arg(long, value_name = "N", global = true)]
    pub decimal_places: Option<u32>,
}

/// Available reports.
#[derive(Subcommand, Debug)]
pub enum Report {
    /// Show account balances
    Balances {
        /// Only show accounts of this type
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        account_type: Option<AccountType>,
        /// Include accounts with a zero balance
        #[arg(short, long)]
        all: bool,
    },
    /// Show the account tree with rolled-up balances
    Tree,
    /// Show monthly totals for a year
    Monthly {
        /// Aggregation mode (cash-flow or revenue)
        #[arg(short, long, default_value = "cash-flow")]
        mode: AggregationMode,
        /// Calendar year
        #[arg(short, long)]
        year: Option<i32>,
        /// Account number to include (can be specified multiple times)
        #[arg(short, long = "account", value_name = "NUMBER")]
        accounts: Vec<String>,
    },
    /// Reconcile an account and list its open items
    OpenItems {
        /// Number of the account to reconcile
        #[arg(short, long, value_name = "NUMBER")]
        account: Option<String>,
        /// Cutoff date, inclusive (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        as_of: Option<NaiveDate>,
    },
    /// Show snapshot statistics and diagnostics
    Stats,
}

/// Main entry point for the report command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut stdout = io::stdout().lock();
    match run(&args, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_writer(io::stderr)
            .init();
    }
}

/// Load the snapshot named by `args` and write the requested report.
pub fn run<W: Write>(args: &Args, writer: &mut W) -> Result<()> {
    // Check if file exists
    if !args.file.exists() {
        bail!("file not found: {}", args.file.display());
    }

    tracing::info!(file = %args.file.display(), "loading snapshot");
    let loaded = loader_for(args)
        .load(&args.file)
        .with_context(|| format!("failed to load {}", args.file.display()))?;

    let report = Reporter {
        snapshot: &loaded.snapshot,
        options: &loaded.options,
        view: LedgerView::new(&loaded.snapshot),
        format: args.format,
    };

    match &args.report {
        Report::Balances { account_type, all } => {
            report.balances(*account_type, *all, writer)?;
        }
        Report::Tree => report.tree(writer)?,
        Report::Monthly { mode, .. } => report.monthly(*mode, writer)?,
        Report::OpenItems { as_of, .. } => report.open_items(*as_of, writer)?,
        Report::Stats => report.stats(&loaded, writer)?,
    }

    Ok(())
}

/// Turn command-line flags into option overrides.
fn loader_for(args: &Args) -> Loader {
    let mut loader = Loader::new();
    if let Some(dp) = args.decimal_places {
        loader = loader.with_override("decimal_places", dp.to_string());
    }

    match &args.report {
        Report::Monthly {
            mode,
            year,
            accounts,
        } => {
            if let Some(year) = year {
                loader = loader.with_override("fiscal_year", year.to_string());
            }
            let key = match mode {
                AggregationMode::CashFlow => "cash_accounts",
                AggregationMode::Revenue => "revenue_accounts",
            };
            for number in accounts {
                loader = loader.with_override(key, number.as_str());
            }
        }
        Report::OpenItems {
            account: Some(number),
            ..
        } => {
            loader = loader.with_override("payables_account", number.as_str());
        }
        _ => {}
    }

    loader
}

/// Account number for display, falling back to the raw id.
fn number_of<'a>(lookup: &HashMap<&AccountId, &'a Account>, id: &'a AccountId) -> &'a str {
    lookup.get(id).map_or(id.as_str(), |&a| a.number.as_str())
}

fn write_json<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    writeln!(writer, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

struct Reporter<'a> {
    snapshot: &'a Snapshot,
    options: &'a Options,
    view: LedgerView<'a>,
    format: OutputFormat,
}

#[derive(Serialize)]
struct BalanceRow<'a> {
    number: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    account_type: AccountType,
    balance: Decimal,
}

#[derive(Serialize)]
struct BalancesOutput<'a> {
    balances: Vec<BalanceRow<'a>>,
    skipped: &'a SkipDiagnostics,
}

#[derive(Serialize)]
struct TreeRow<'a> {
    level: usize,
    number: &'a str,
    name: &'a str,
    group: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    account_type: Option<AccountType>,
    balance: Decimal,
}

#[derive(Serialize)]
struct MonthlyOutput<'a> {
    year: i32,
    accounts: Vec<&'a str>,
    #[serde(flatten)]
    series: &'a MonthlySeries,
    total: Decimal,
}

#[derive(Serialize)]
struct StatsOutput<'a> {
    file: String,
    version: u64,
    accounts: usize,
    accounts_by_type: Vec<(AccountType, usize)>,
    groups: usize,
    transactions: usize,
    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
    hierarchy_error: Option<String>,
    skipped: SkipDiagnostics,
    option_warnings: Vec<WarningRow<'a>>,
}

#[derive(Serialize)]
struct WarningRow<'a> {
    code: &'a str,
    option: &'a str,
    message: &'a str,
}

impl<'a> From<&'a OptionWarning> for WarningRow<'a> {
    fn from(w: &'a OptionWarning) -> Self {
        Self {
            code: w.code,
            option: &w.option,
            message: &w.message,
        }
    }
}

impl<'a> Reporter<'a> {
    fn amount(&self, amount: Decimal) -> String {
        format_amount(amount, self.options.decimal_places)
    }

    fn header<W: Write>(&self, writer: &mut W, name: &str, width: usize) -> Result<()> {
        if let Some(title) = &self.options.title {
            writeln!(writer, "{title}")?;
        }
        writeln!(writer, "{name}")?;
        writeln!(writer, "{}", "=".repeat(width))?;
        writeln!(writer)?;
        Ok(())
    }

    fn accounts_by_id(&self) -> HashMap<&'a AccountId, &'a Account> {
        self.snapshot.accounts.iter().map(|a| (&a.id, a)).collect()
    }

    /// The year for monthly reports and the default cutoff.
    fn year(&self) -> Option<i32> {
        self.options
            .fiscal_year
            .or_else(|| self.last_date().map(|d| d.year()))
    }

    fn last_date(&self) -> Option<NaiveDate> {
        self.snapshot.transactions.iter().map(|tx| tx.date).max()
    }

    fn first_date(&self) -> Option<NaiveDate> {
        self.snapshot.transactions.iter().map(|tx| tx.date).min()
    }

    /// Generate a balances report.
    fn balances<W: Write>(
        &self,
        account_type: Option<AccountType>,
        all: bool,
        writer: &mut W,
    ) -> Result<()> {
        let report = self.view.balance_report();

        let mut accounts: Vec<&Account> = self
            .snapshot
            .accounts
            .iter()
            .filter(|a| account_type.map_or(true, |ty| a.account_type == ty))
            .collect();
        accounts.sort_by(|a, b| collate(&a.number, &b.number));

        let rows: Vec<BalanceRow<'_>> = accounts
            .into_iter()
            .map(|a| BalanceRow {
                number: &a.number,
                name: &a.name,
                account_type: a.account_type,
                balance: report.balances.get(&a.id).copied().unwrap_or_default(),
            })
            .filter(|row| all || !row.balance.is_zero())
            .collect();

        if self.format == OutputFormat::Json {
            return write_json(
                writer,
                &BalancesOutput {
                    balances: rows,
                    skipped: &report.skipped,
                },
            );
        }

        self.header(writer, "Account Balances", 60)?;
        for row in &rows {
            writeln!(
                writer,
                "{:<8} {:<30} {:<9} {:>10}",
                row.number,
                row.name,
                row.account_type.as_str(),
                self.amount(row.balance)
            )?;
        }

        if !report.skipped.is_clean() {
            writeln!(writer)?;
            writeln!(
                writer,
                "Skipped {} posting side(s) referencing unknown accounts: {}",
                report.skipped.skipped_sides(),
                report
                    .skipped
                    .unresolved_accounts
                    .iter()
                    .map(AccountId::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
        }

        Ok(())
    }

    /// Generate the account tree.
    fn tree<W: Write>(&self, writer: &mut W) -> Result<()> {
        let tree = self.view.hierarchy().context("failed to build account tree")?;
        let totals = tree.rollup(&self.view.balances());

        let rows: Vec<TreeRow<'_>> = tree
            .walk()
            .into_iter()
            .map(|node| TreeRow {
                level: node.level,
                number: &node.number,
                name: &node.name,
                group: node.is_group(),
                account_type: match node.kind {
                    NodeKind::Group => None,
                    NodeKind::Account(ty) => Some(ty),
                },
                balance: totals.get(&node.id).copied().unwrap_or_default(),
            })
            .collect();

        if self.format == OutputFormat::Json {
            return write_json(writer, &rows);
        }

        self.header(writer, "Account Tree", 60)?;
        for row in &rows {
            let label = format!("{}{} {}", indent(row.level), row.number, row.name);
            writeln!(writer, "{label:<45} {:>14}", self.amount(row.balance))?;
        }

        Ok(())
    }

    /// Generate a monthly series.
    fn monthly<W: Write>(&self, mode: AggregationMode, writer: &mut W) -> Result<()> {
        let Some(year) = self.year() else {
            bail!("no year given: pass --year or set the fiscal_year option");
        };

        let selected: HashSet<AccountId> = match mode {
            AggregationMode::CashFlow => {
                if self.options.cash_accounts.is_empty() {
                    bail!("no cash accounts configured: pass --account or set the cash_accounts option");
                }
                self.options.cash_account_ids(self.snapshot)
            }
            AggregationMode::Revenue => {
                if self.options.revenue_accounts.is_empty() {
                    self.snapshot
                        .accounts
                        .iter()
                        .filter(|a| a.account_type == AccountType::Revenue)
                        .map(|a| a.id.clone())
                        .collect()
                } else {
                    self.options.revenue_account_ids(self.snapshot)
                }
            }
        };
        if selected.is_empty() {
            tracing::warn!(%mode, "no matching accounts selected, all months will be zero");
        }

        let series = self
            .view
            .monthly(year, &selected, mode)
            .with_context(|| format!("failed to aggregate {mode} series for {year}"))?;

        let lookup = self.accounts_by_id();
        let mut numbers: Vec<&str> = selected
            .iter()
            .map(|id| number_of(&lookup, id))
            .collect();
        numbers.sort_by(|a, b| collate(a, b));

        if self.format == OutputFormat::Json {
            return write_json(
                writer,
                &MonthlyOutput {
                    year,
                    accounts: numbers,
                    series: &series,
                    total: series.total(),
                },
            );
        }

        let name = match mode {
            AggregationMode::CashFlow => format!("Cash Flow {year}"),
            AggregationMode::Revenue => format!("Revenue {year}"),
        };
        self.header(writer, &name, 60)?;
        writeln!(writer, "Accounts: {}", numbers.join(", "))?;
        writeln!(writer)?;

        match &series {
            MonthlySeries::CashFlow(months) => {
                writeln!(
                    writer,
                    "{:<8} {:>14} {:>14} {:>14}",
                    "Month", "Income", "Expenses", "Net"
                )?;
                for m in months {
                    writeln!(
                        writer,
                        "{:<8} {:>14} {:>14} {:>14}",
                        month_label(m.start),
                        self.amount(m.income),
                        self.amount(m.expenses),
                        self.amount(m.net())
                    )?;
                }
                let income: Decimal = months.iter().map(|m| m.income).sum();
                let expenses: Decimal = months.iter().map(|m| m.expenses).sum();
                writeln!(writer, "{}", "-".repeat(53))?;
                writeln!(
                    writer,
                    "{:<8} {:>14} {:>14} {:>14}",
                    "Total",
                    self.amount(income),
                    self.amount(expenses),
                    self.amount(series.total())
                )?;
            }
            MonthlySeries::Revenue(months) => {
                writeln!(writer, "{:<8} {:>14}", "Month", "Revenue")?;
                for m in months {
                    writeln!(
                        writer,
                        "{:<8} {:>14}",
                        month_label(m.start),
                        self.amount(m.value)
                    )?;
                }
                writeln!(writer, "{}", "-".repeat(23))?;
                writeln!(writer, "{:<8} {:>14}", "Total", self.amount(series.total()))?;
            }
        }

        Ok(())
    }

    /// Generate an open-item reconciliation.
    fn open_items<W: Write>(&self, as_of: Option<NaiveDate>, writer: &mut W) -> Result<()> {
        let Some(number) = self.options.payables_account.as_deref() else {
            bail!("no account given: pass --account or set the payables_account option");
        };
        let Some(account) = self.options.payables_account_id(self.snapshot) else {
            bail!("account number {number} not found");
        };

        let cutoff = as_of
            .or_else(|| {
                self.options
                    .fiscal_year
                    .and_then(|y| NaiveDate::from_ymd_opt(y, 12, 31))
            })
            .or_else(|| self.last_date());
        let Some(cutoff) = cutoff else {
            bail!("no cutoff date: pass --as-of");
        };

        let result = self.view.reconcile(&account, cutoff);

        if self.format == OutputFormat::Json {
            return write_json(writer, &result);
        }

        let lookup = self.accounts_by_id();
        let name = lookup.get(&account).map_or("", |a| a.name.as_str());

        self.header(writer, "Open Items", 60)?;
        writeln!(writer, "Account:    {number} {name}")?;
        writeln!(writer, "As of:      {}", result.as_of)?;
        writeln!(writer, "Balance:    {}", self.amount(result.balance))?;
        writeln!(writer, "Open items: {}", result.open_item_count)?;

        if !result.open_items.is_empty() {
            writeln!(writer)?;
            for item in &result.open_items {
                writeln!(
                    writer,
                    "  {}  {:<12} {:<8} {:>14}",
                    item.date,
                    item.transaction_id.as_str(),
                    number_of(&lookup, &item.counter_account),
                    self.amount(item.amount)
                )?;
            }
            writeln!(writer)?;
            writeln!(writer, "Open amount: {}", self.amount(result.open_amount()))?;
        }

        Ok(())
    }

    /// Generate snapshot statistics.
    fn stats<W: Write>(&self, loaded: &LoadResult, writer: &mut W) -> Result<()> {
        let report = self.view.balance_report();
        let hierarchy_error = self.view.hierarchy().err().map(|e| e.to_string());
        let accounts_by_type: Vec<(AccountType, usize)> = AccountType::ALL
            .iter()
            .map(|&ty| {
                let count = self
                    .snapshot
                    .accounts
                    .iter()
                    .filter(|a| a.account_type == ty)
                    .count();
                (ty, count)
            })
            .collect();

        let stats = StatsOutput {
            file: loaded.path.display().to_string(),
            version: self.snapshot.version,
            accounts: self.snapshot.accounts.len(),
            accounts_by_type,
            groups: self.snapshot.groups.len(),
            transactions: self.snapshot.transactions.len(),
            first_date: self.first_date(),
            last_date: self.last_date(),
            hierarchy_error,
            skipped: report.skipped,
            option_warnings: self.options.warnings.iter().map(WarningRow::from).collect(),
        };

        if self.format == OutputFormat::Json {
            return write_json(writer, &stats);
        }

        self.header(writer, "Snapshot Statistics", 40)?;
        writeln!(writer, "File:    {}", stats.file)?;
        writeln!(writer, "Version: {}", stats.version)?;
        writeln!(writer)?;
        writeln!(writer, "Date Range:")?;
        if let (Some(first), Some(last)) = (stats.first_date, stats.last_date) {
            writeln!(writer, "  First: {first}")?;
            writeln!(writer, "  Last:  {last}")?;
        }
        writeln!(writer)?;
        writeln!(writer, "Records:")?;
        writeln!(writer, "  Accounts:       {:>6}", stats.accounts)?;
        for (ty, count) in &stats.accounts_by_type {
            writeln!(writer, "    {:<12} {:>6}", ty.as_str(), count)?;
        }
        writeln!(writer, "  Groups:         {:>6}", stats.groups)?;
        writeln!(writer, "  Transactions:   {:>6}", stats.transactions)?;
        writeln!(writer)?;
        writeln!(writer, "Diagnostics:")?;
        writeln!(
            writer,
            "  Skipped sides:  {:>6}",
            stats.skipped.skipped_sides()
        )?;
        match &stats.hierarchy_error {
            Some(e) => writeln!(writer, "  Account tree:   {e}")?,
            None => writeln!(writer, "  Account tree:   ok")?,
        }
        for warning in &stats.option_warnings {
            writeln!(writer, "  {}: {}", warning.code, warning.message)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_monthly_args() {
        let args = Args::try_parse_from([
            "lb-report",
            "ledger.json",
            "monthly",
            "--mode",
            "revenue",
            "--year",
            "2024",
            "-a",
            "8400",
            "-a",
            "8401",
        ])
        .unwrap();

        match args.report {
            Report::Monthly {
                mode,
                year,
                accounts,
            } => {
                assert_eq!(mode, AggregationMode::Revenue);
                assert_eq!(year, Some(2024));
                assert_eq!(accounts, vec!["8400", "8401"]);
            }
            other => panic!("unexpected report {other:?}"),
        }
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "lb-report",
            "ledger.json",
            "balances",
            "--type",
            "liabilities",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();

        assert!(args.verbose);
        assert_eq!(args.format, OutputFormat::Json);
        assert!(matches!(
            args.report,
            Report::Balances {
                account_type: Some(AccountType::Liability),
                all: false
            }
        ));
    }

    #[test]
    fn test_parse_open_items_date() {
        let args = Args::try_parse_from([
            "lb-report",
            "ledger.json",
            "open-items",
            "--as-of",
            "2024-06-30",
        ])
        .unwrap();
        assert!(matches!(
            args.report,
            Report::OpenItems { account: None, as_of: Some(d) } if d == NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
        ));
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let result = Args::try_parse_from(["lb-report", "x.json", "monthly", "--mode", "profit"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_from_flags() {
        let args = Args::try_parse_from([
            "lb-report",
            "x.json",
            "--decimal-places",
            "0",
            "monthly",
            "--year",
            "2023",
            "--account",
            "1000",
        ])
        .unwrap();

        let loaded = loader_for(&args)
            .load_str(
                r#"{ "options": { "fiscal_year": 2020, "cash_accounts": ["1200"] } }"#,
                args.file.as_path(),
            )
            .unwrap();
        assert_eq!(loaded.options.fiscal_year, Some(2023));
        assert_eq!(loaded.options.cash_accounts, vec!["1000"]);
        assert_eq!(loaded.options.decimal_places, 0);
    }
}
