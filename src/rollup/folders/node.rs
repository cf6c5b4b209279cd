use super::required_timestamp;
use crate::error::Result;
use crate::rollup::buckets::{Accumulator, BucketMaps};
use crate::rollup::calendar::Timeframe;
use crate::rollup::numeric::Counter;
use crate::rollup::types::{MetricType, MetricValue, Node, RollupRecord};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct NodeStatistics {
    pub register_node: Counter,
}

impl Accumulator for NodeStatistics {
    fn records(&self, timeframe: Timeframe, timestamp: DateTime<Utc>) -> Vec<RollupRecord> {
        vec![RollupRecord::new(
            MetricType::RegisterNode,
            timeframe,
            timestamp,
            MetricValue::Count(self.register_node.value()),
        )]
    }
}

/// Count node registrations per bucket
pub fn fold_nodes(items: &[Node]) -> Result<BucketMaps<NodeStatistics>> {
    log::info!("📊 StatisticsFromNodes: {} nodes", items.len());

    let mut buckets = BucketMaps::<NodeStatistics>::new();
    for item in items {
        let registered = required_timestamp("nodes", &item.address, item.register_timestamp)?;
        buckets.at_point(registered, |s| s.register_node.incr("register_node"))?;
    }

    Ok(buckets)
}
