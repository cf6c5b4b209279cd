//! Statistics job configuration
//!
//! Environment first (after `.env` is loaded by the binary), then command-line
//! flags override it.

use crate::error::{Result, StatisticsError};
use crate::rollup::exclusion::ExclusionSet;
use std::env;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "data/explorer.db";

/// System account whose activity is never counted
pub const DEFAULT_EXCLUDE_ADDRS: &str = "sent1c4nvz43tlw6d0c9nfu6r957y5d9pgjk5czl3n3";

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct StatisticsConfig {
    /// Path to the explorer SQLite database
    pub db_path: String,

    /// Accounts dropped from session and subscription statistics
    pub exclude: ExclusionSet,

    /// How long a publish waits for another run's write lock
    pub busy_timeout: Duration,
}

impl StatisticsConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `STATISTICS_DB_PATH` (default: data/explorer.db)
    /// - `STATISTICS_EXCLUDE_ADDRS` (comma-separated, default: the system account;
    ///   set it empty to exclude nobody)
    /// - `STATISTICS_BUSY_TIMEOUT_MS` (default: 30000)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let exclude = lookup("STATISTICS_EXCLUDE_ADDRS")
            .unwrap_or_else(|| DEFAULT_EXCLUDE_ADDRS.to_string());

        Self {
            db_path: lookup("STATISTICS_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),

            exclude: ExclusionSet::parse(&exclude),

            busy_timeout: Duration::from_millis(
                lookup("STATISTICS_BUSY_TIMEOUT_MS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
            ),
        }
    }

    /// Apply `--db-path <path>` and `--exclude-addrs <list>` overrides
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        if let Some(db_path) = flag_value(args, "--db-path")? {
            self.db_path = db_path.to_string();
        }
        if let Some(list) = flag_value(args, "--exclude-addrs")? {
            self.exclude = ExclusionSet::parse(list);
        }
        Ok(())
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>> {
    match args.iter().position(|arg| arg == flag) {
        None => Ok(None),
        Some(idx) => match args.get(idx + 1) {
            Some(value) if !value.starts_with("--") => Ok(Some(value.as_str())),
            _ => Err(StatisticsError::Config(format!("{} requires a value", flag))),
        },
    }
}
