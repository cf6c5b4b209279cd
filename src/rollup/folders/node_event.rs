use super::required_timestamp;
use crate::error::Result;
use crate::rollup::buckets::{Accumulator, BucketMaps};
use crate::rollup::calendar::Timeframe;
use crate::rollup::numeric::Counter;
use crate::rollup::types::{MetricType, MetricValue, NodeEvent, NodeStatus, RollupRecord};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct NodeEventStatistics {
    pub status_active: Counter,
    pub status_inactive: Counter,
}

impl Accumulator for NodeEventStatistics {
    fn records(&self, timeframe: Timeframe, timestamp: DateTime<Utc>) -> Vec<RollupRecord> {
        vec![
            RollupRecord::new(
                MetricType::NodeStatusActive,
                timeframe,
                timestamp,
                MetricValue::Count(self.status_active.value()),
            ),
            RollupRecord::new(
                MetricType::NodeStatusInactive,
                timeframe,
                timestamp,
                MetricValue::Count(self.status_inactive.value()),
            ),
        ]
    }
}

/// Count node status transitions per bucket
pub fn fold_node_events(items: &[NodeEvent]) -> Result<BucketMaps<NodeEventStatistics>> {
    log::info!("📊 StatisticsFromNodeEvents: {} events", items.len());

    let mut buckets = BucketMaps::<NodeEventStatistics>::new();
    for item in items {
        let timestamp = required_timestamp("node_events", item.id, item.timestamp)?;
        buckets.at_point(timestamp, |s| match item.status {
            NodeStatus::Active => s.status_active.incr("node_status_active"),
            NodeStatus::Inactive => s.status_inactive.incr("node_status_inactive"),
        })?;
    }

    Ok(buckets)
}
