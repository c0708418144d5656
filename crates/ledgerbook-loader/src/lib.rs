//! Snapshot loader for ledgerbook.
//!
//! This crate reads a ledger snapshot from a JSON document and collects the
//! report options stored alongside it. It stands in for the remote store
//! that feeds the aggregation engine.
//!
//! The document layout is:
//!
//! ```json
//! {
//!   "version": 3,
//!   "options": { "title": "Acme", "cash_accounts": ["1000", "1200"] },
//!   "accounts": [ { "id": "bank", "number": "1200", "name": "Bank", "type": "asset" } ],
//!   "groups": [],
//!   "transactions": []
//! }
//! ```
//!
//! Every top-level key is optional. Option values may be strings, numbers or
//! booleans; a list sets a repeatable option once per element.
//!
//! # Example
//!
//! ```no_run
//! use ledgerbook_loader::Loader;
//! use std::path::Path;
//!
//! let result = Loader::new().load(Path::new("ledger.json"))?;
//! println!("{} transactions", result.snapshot.transactions.len());
//! # Ok::<(), ledgerbook_loader::LoadError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod options;

pub use options::{OptionWarning, Options};

use ledgerbook_core::{Account, AccountGroup, Snapshot, Transaction};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during loading.
#[derive(Debug, Error)]
pub enum LoadError {
    /// IO error reading a file.
    #[error("failed to read file {path}: {source}")]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid snapshot document.
    #[error("failed to parse {path}: {source}")]
    Json {
        /// The file that failed to parse.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result of loading a snapshot document.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded snapshot.
    pub snapshot: Snapshot,
    /// Parsed options, with overrides applied.
    pub options: Options,
    /// The file the snapshot was read from.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    version: u64,
    #[serde(default)]
    options: Map<String, Value>,
    #[serde(default)]
    accounts: Vec<Account>,
    #[serde(default)]
    groups: Vec<AccountGroup>,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

/// Snapshot loader.
#[derive(Debug, Default)]
pub struct Loader {
    /// Option values that replace whatever the document sets.
    overrides: Vec<(String, String)>,
}

impl Loader {
    /// Create a new loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override an option after the document's own options are read.
    ///
    /// Overriding a repeatable option replaces the document's list; calling
    /// this several times with the same key builds a new list.
    #[must_use]
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// Load a snapshot document from `path`.
    pub fn load(&self, path: &Path) -> Result<LoadResult, LoadError> {
        let contents = fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.load_str(&contents, path)
    }

    /// Load a snapshot document already read into memory.
    ///
    /// `path` is only used for error messages and [`LoadResult::path`].
    pub fn load_str(&self, contents: &str, path: &Path) -> Result<LoadResult, LoadError> {
        let document: Document =
            serde_json::from_str(contents).map_err(|e| LoadError::Json {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut options = Options::new();
        for (key, value) in &document.options {
            set_json_option(&mut options, key, value);
        }
        self.apply_overrides(&mut options);

        let snapshot = Snapshot {
            version: document.version,
            accounts: document.accounts,
            groups: document.groups,
            transactions: document.transactions,
        };
        options.check_accounts(&snapshot);

        tracing::debug!(
            path = %path.display(),
            version = snapshot.version,
            accounts = snapshot.accounts.len(),
            groups = snapshot.groups.len(),
            transactions = snapshot.transactions.len(),
            warnings = options.warnings.len(),
            "loaded snapshot"
        );
        for warning in &options.warnings {
            tracing::warn!(code = warning.code, "{}", warning.message);
        }

        Ok(LoadResult {
            snapshot,
            options,
            path: path.to_path_buf(),
        })
    }

    fn apply_overrides(&self, options: &mut Options) {
        let mut cleared: Vec<&str> = Vec::new();
        for (key, value) in &self.overrides {
            if !cleared.contains(&key.as_str()) {
                options.clear(key);
                cleared.push(key);
            }
            options.set(key, value);
        }
    }
}

fn set_json_option(options: &mut Options, key: &str, value: &Value) {
    match value {
        Value::String(s) => options.set(key, s),
        Value::Number(n) => options.set(key, &n.to_string()),
        Value::Bool(b) => options.set(key, &b.to_string()),
        Value::Array(items) => {
            for item in items {
                set_json_option(options, key, item);
            }
        }
        Value::Null | Value::Object(_) => options.set(key, &value.to_string()),
    }
}

/// Load a snapshot document with default settings.
pub fn load(path: &Path) -> Result<LoadResult, LoadError> {
    Loader::new().load(path)
}
