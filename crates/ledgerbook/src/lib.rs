//! Ledgerbook command-line tools.
//!
//! This crate provides the `lb-report` tool, which loads a ledger snapshot
//! and prints the views computed by `ledgerbook-engine`:
//!
//! - `balances`: Signed balance per account
//! - `tree`: Account tree with rolled-up balances
//! - `monthly`: Cash-flow or revenue series for a year
//! - `open-items`: Open-item reconciliation of a payables account
//! - `stats`: Snapshot statistics and diagnostics
//!
//! # Example Usage
//!
//! ```bash
//! lb-report ledger.json balances --type asset
//! lb-report ledger.json monthly --mode revenue --year 2024
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod format;
