//! Shared fixtures: a throwaway explorer database seeded with raw SQL

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use explorer_stats::rollup::ExclusionSet;
use explorer_stats::{SqliteStore, StatisticsConfig};
use rusqlite::{params, Connection};
use std::time::Duration;
use tempfile::TempDir;

pub struct TestDb {
    pub dir: TempDir,
    pub store: SqliteStore,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("explorer.db"), Duration::from_secs(5));
        store.ensure_schema().unwrap();
        Self { dir, store }
    }

    pub fn conn(&self) -> Connection {
        Connection::open(self.store.db_path()).unwrap()
    }

    pub fn config(&self, exclude: &str) -> StatisticsConfig {
        StatisticsConfig {
            db_path: self.store.db_path().display().to_string(),
            exclude: ExclusionSet::parse(exclude),
            busy_timeout: Duration::from_secs(5),
        }
    }

    pub fn block(&self, height: i64, time: i64) {
        self.conn()
            .execute(
                "INSERT INTO blocks (height, time) VALUES (?1, ?2)",
                params![height, time],
            )
            .unwrap();
    }

    pub fn subscription(
        &self,
        id: i64,
        acc_address: &str,
        start: Option<i64>,
        end: Option<i64>,
        deposit: Option<&str>,
        refund: Option<&str>,
    ) {
        self.conn()
            .execute(
                "INSERT INTO subscriptions
                    (id, acc_address, deposit, refund, start_timestamp, end_timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, acc_address, deposit, refund, start, end],
            )
            .unwrap();
    }

    pub fn session(&self, id: i64, acc_address: &str, start: i64, end: Option<i64>, payment: &str) {
        self.conn()
            .execute(
                "INSERT INTO sessions
                    (id, subscription_id, acc_address, node_address, payment,
                     start_timestamp, end_timestamp)
                 VALUES (?1, 1, ?2, 'sentnode1a', ?3, ?4, ?5)",
                params![id, acc_address, payment, start, end],
            )
            .unwrap();
    }

    pub fn node(&self, address: &str, registered: Option<i64>) {
        self.conn()
            .execute(
                "INSERT INTO nodes (address, register_timestamp) VALUES (?1, ?2)",
                params![address, registered],
            )
            .unwrap();
    }

    pub fn statistics_count(&self) -> i64 {
        self.conn()
            .query_row("SELECT COUNT(*) FROM statistics", [], |row| row.get(0))
            .unwrap()
    }
}

/// Unix seconds at midnight UTC
pub fn midnight(y: i32, m: u32, d: u32) -> i64 {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap().timestamp()
}
