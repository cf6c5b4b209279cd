//! SQLite-backed source reader and snapshot publisher
//!
//! Every read opens its own query-only connection on a blocking thread so the
//! six folders read in parallel. WAL readers only ever see committed
//! snapshots.
//!
//! Publishing runs delete-all + insert-all inside one IMMEDIATE transaction
//! with `synchronous = FULL`. Concurrent runs queue on SQLite's write lock
//! (bounded by the busy timeout); a failed run rolls back and leaves the
//! previous snapshot in place.

use super::rows::{self, SELECT_LATEST_BLOCK};
use super::{SnapshotPublisher, SourceStore, StatisticFilter};
use crate::error::{Result, StatisticsError};
use crate::rollup::types::{
    Block, Node, NodeEvent, RollupRecord, Session, SessionEvent, Subscription, SubscriptionPayout,
};
use crate::sqlite_pragma::{apply_optimized_pragmas, apply_publish_pragmas};
use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS blocks (
    height              INTEGER PRIMARY KEY,
    time                INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS nodes (
    address             TEXT PRIMARY KEY,
    register_timestamp  INTEGER
);

CREATE TABLE IF NOT EXISTS node_events (
    id                  INTEGER PRIMARY KEY,
    node_address        TEXT NOT NULL,
    status              TEXT NOT NULL,
    timestamp           INTEGER
);

CREATE TABLE IF NOT EXISTS session_events (
    id                  INTEGER PRIMARY KEY,
    session_id          INTEGER NOT NULL,
    acc_address         TEXT NOT NULL,
    node_address        TEXT NOT NULL,
    upload_bytes        TEXT NOT NULL DEFAULT '0',
    download_bytes      TEXT NOT NULL DEFAULT '0',
    duration_secs       INTEGER NOT NULL DEFAULT 0,
    timestamp           INTEGER
);

CREATE TABLE IF NOT EXISTS sessions (
    id                  INTEGER PRIMARY KEY,
    subscription_id     INTEGER,
    acc_address         TEXT NOT NULL,
    node_address        TEXT NOT NULL,
    payment             TEXT,
    staking_reward      TEXT,
    start_timestamp     INTEGER,
    end_timestamp       INTEGER
);

CREATE TABLE IF NOT EXISTS subscriptions (
    id                  INTEGER PRIMARY KEY,
    acc_address         TEXT NOT NULL,
    node_address        TEXT,
    plan_id             INTEGER NOT NULL DEFAULT 0,
    gigabytes           INTEGER NOT NULL DEFAULT 0,
    hours               INTEGER NOT NULL DEFAULT 0,
    deposit             TEXT,
    refund              TEXT,
    payment             TEXT,
    staking_reward      TEXT,
    start_timestamp     INTEGER,
    end_timestamp       INTEGER
);

CREATE TABLE IF NOT EXISTS subscription_payouts (
    id                  INTEGER PRIMARY KEY,
    subscription_id     INTEGER NOT NULL,
    node_address        TEXT NOT NULL,
    hours               INTEGER NOT NULL DEFAULT 0,
    amount              TEXT,
    timestamp           INTEGER
);

CREATE TABLE IF NOT EXISTS statistics (
    type                TEXT NOT NULL,
    timeframe           TEXT NOT NULL,
    timestamp           INTEGER NOT NULL,
    value               TEXT NOT NULL,
    UNIQUE (type, timeframe, timestamp)
);

CREATE INDEX IF NOT EXISTS idx_statistics_type_timestamp
    ON statistics (type, timestamp DESC);
";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteStore {
    pub fn new(db_path: impl AsRef<Path>, busy_timeout: Duration) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            busy_timeout,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(self.busy_timeout)?;
        apply_optimized_pragmas(&conn)?;
        Ok(conn)
    }

    fn open_reader(&self) -> Result<Connection> {
        let conn = self.open()?;
        conn.execute_batch("PRAGMA query_only = ON")?;
        Ok(conn)
    }

    /// Create missing tables and indexes
    pub fn ensure_schema(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StatisticsError::Config(format!(
                        "cannot create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = self.open()?;
        conn.execute_batch(SCHEMA)?;
        log::info!("✅ Schema ready at {}", self.db_path.display());
        Ok(())
    }

    /// Published records matching `filter`, ordered by timestamp
    pub fn find_statistics(&self, filter: &StatisticFilter) -> Result<Vec<RollupRecord>> {
        let mut sql = String::from("SELECT type, timeframe, timestamp, value FROM statistics");
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(metric) = filter.metric {
            clauses.push("type = ?");
            values.push(Value::Text(metric.as_str().to_string()));
        }
        if let Some(timeframe) = filter.timeframe {
            clauses.push("timeframe = ?");
            values.push(Value::Text(timeframe.as_str().to_string()));
        }
        if let Some(from) = filter.from {
            clauses.push("timestamp >= ?");
            values.push(Value::Integer(from.timestamp()));
        }
        if let Some(to) = filter.to {
            clauses.push("timestamp <= ?");
            values.push(Value::Integer(to.timestamp()));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY timestamp ASC, type ASC, timeframe ASC");

        let conn = self.open_reader()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut cursor = stmt.query(params_from_iter(values.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = cursor.next()? {
            records.push(rows::statistic(row)?);
        }
        Ok(records)
    }

    fn replace_snapshot_blocking(&self, records: &[RollupRecord]) -> Result<usize> {
        let started = Instant::now();
        let mut conn = self.open()?;
        apply_publish_pragmas(&conn)?;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let deleted = tx.execute("DELETE FROM statistics", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO statistics (type, timeframe, timestamp, value)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for record in records {
                let value = serde_json::to_string(&record.value)?;
                stmt.execute(params![
                    record.metric.as_str(),
                    record.timeframe.as_str(),
                    record.timestamp.timestamp(),
                    value,
                ])?;
            }
        }
        tx.commit()?;

        log::info!("💾 Published statistics snapshot");
        log::info!("   ├─ Deleted: {}", deleted);
        log::info!("   ├─ Inserted: {}", records.len());
        log::info!("   └─ Took: {:?}", started.elapsed());

        Ok(records.len())
    }

    async fn read_all<T, F>(&self, sql: &'static str, decode: F) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: Fn(&Row) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<T>> {
            let conn = store.open_reader()?;
            let mut stmt = conn.prepare(sql)?;
            let mut cursor = stmt.query([])?;
            let mut items = Vec::new();
            while let Some(row) = cursor.next()? {
                items.push(decode(row)?);
            }
            Ok(items)
        })
        .await?
    }
}

#[async_trait]
impl SourceStore for SqliteStore {
    async fn find_nodes(&self) -> Result<Vec<Node>> {
        self.read_all(rows::SELECT_NODES, rows::node).await
    }

    async fn find_node_events(&self) -> Result<Vec<NodeEvent>> {
        self.read_all(rows::SELECT_NODE_EVENTS, rows::node_event).await
    }

    async fn find_session_events(&self) -> Result<Vec<SessionEvent>> {
        self.read_all(rows::SELECT_SESSION_EVENTS, rows::session_event)
            .await
    }

    async fn find_sessions(&self) -> Result<Vec<Session>> {
        self.read_all(rows::SELECT_SESSIONS, rows::session).await
    }

    async fn find_subscriptions(&self) -> Result<Vec<Subscription>> {
        self.read_all(rows::SELECT_SUBSCRIPTIONS, rows::subscription)
            .await
    }

    async fn find_subscription_payouts(&self) -> Result<Vec<SubscriptionPayout>> {
        self.read_all(rows::SELECT_SUBSCRIPTION_PAYOUTS, rows::subscription_payout)
            .await
    }

    async fn latest_block(&self) -> Result<Option<Block>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<Block>> {
            let conn = store.open_reader()?;
            let mut stmt = conn.prepare(SELECT_LATEST_BLOCK)?;
            let mut cursor = stmt.query([])?;
            cursor.next()?.map(rows::block).transpose()
        })
        .await?
    }
}

#[async_trait]
impl SnapshotPublisher for SqliteStore {
    async fn prepare(&self) -> Result<()> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.ensure_schema()).await?
    }

    async fn replace_snapshot(&self, records: Vec<RollupRecord>) -> Result<usize> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.replace_snapshot_blocking(&records)).await?
    }
}
