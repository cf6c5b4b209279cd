//! Statistics job entry point
//!
//! Recomputes every rollup from the raw explorer collections and replaces the
//! published snapshot. Meant to be run on a schedule; exits non-zero on any
//! failure so the scheduler can alert.
//!
//! Usage:
//!   statistics [--db-path <path>] [--exclude-addrs <addr,addr,...>]

use explorer_stats::{SqliteStore, StatisticsConfig, StatisticsJob};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let mut config = StatisticsConfig::from_env();
    let args: Vec<String> = env::args().collect();
    if let Err(e) = config.apply_args(&args) {
        log::error!("❌ {}", e);
        return ExitCode::FAILURE;
    }

    log::info!("📊 Sentinel explorer statistics");
    log::info!("   ├─ Database: {}", config.db_path);
    log::info!("   ├─ Excluded accounts: {}", config.exclude.len());
    log::info!("   └─ Busy timeout: {:?}", config.busy_timeout);

    let store = Arc::new(SqliteStore::new(&config.db_path, config.busy_timeout));
    let mut job = StatisticsJob::new(store, &config);

    match job.run().await {
        Ok(report) => {
            log::info!(
                "✅ Published {} records up to {} in {:?}",
                report.records_published,
                report.upper_bound,
                report.duration
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}
