//! Storage seams for the statistics job
//!
//! `SourceStore` reads raw explorer entities, `SnapshotPublisher` replaces the
//! published rollup snapshot. `SqliteStore` implements both.

pub mod rows;
pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::rollup::calendar::Timeframe;
use crate::rollup::types::{
    Block, MetricType, Node, NodeEvent, RollupRecord, Session, SessionEvent, Subscription,
    SubscriptionPayout,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read access to the raw entity collections
///
/// Every `find_*` returns an empty list, not an error, when nothing matches.
/// Reads are unlocked and may observe a collection mid-update.
#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn find_nodes(&self) -> Result<Vec<Node>>;

    async fn find_node_events(&self) -> Result<Vec<NodeEvent>>;

    async fn find_session_events(&self) -> Result<Vec<SessionEvent>>;

    async fn find_sessions(&self) -> Result<Vec<Session>>;

    async fn find_subscriptions(&self) -> Result<Vec<Subscription>>;

    async fn find_subscription_payouts(&self) -> Result<Vec<SubscriptionPayout>>;

    /// Most recently indexed block, if any
    async fn latest_block(&self) -> Result<Option<Block>>;
}

/// Write access to the published statistics snapshot
#[async_trait]
pub trait SnapshotPublisher: Send + Sync {
    /// Create whatever the publisher needs before the first publish
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// Atomically swap the whole snapshot for `records`
    ///
    /// Either every existing record is replaced by the new set, or nothing
    /// changes. Returns the number of records inserted.
    async fn replace_snapshot(&self, records: Vec<RollupRecord>) -> Result<usize>;
}

/// Query over the published snapshot; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatisticFilter {
    pub metric: Option<MetricType>,
    pub timeframe: Option<Timeframe>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl StatisticFilter {
    pub fn metric(metric: MetricType) -> Self {
        Self {
            metric: Some(metric),
            ..Self::default()
        }
    }

    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = Some(timeframe);
        self
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }
}
