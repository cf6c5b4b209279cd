use super::{non_negative, required_timestamp};
use crate::error::Result;
use crate::rollup::buckets::{Accumulator, BucketMaps};
use crate::rollup::calendar::Timeframe;
use crate::rollup::exclusion::ExclusionSet;
use crate::rollup::numeric::{BigTotal, Counter};
use crate::rollup::types::{MetricType, MetricValue, RollupRecord, SessionEvent};
use chrono::{DateTime, Utc};

const SECONDS_PER_HOUR: i64 = 3600;

#[derive(Debug, Clone, Default)]
pub struct SessionEventStatistics {
    pub update_session: Counter,
    pub session_bytes: BigTotal,
    /// Summed in seconds, published as whole hours
    pub session_duration_secs: Counter,
}

impl Accumulator for SessionEventStatistics {
    fn records(&self, timeframe: Timeframe, timestamp: DateTime<Utc>) -> Vec<RollupRecord> {
        vec![
            RollupRecord::new(
                MetricType::UpdateSession,
                timeframe,
                timestamp,
                MetricValue::Count(self.update_session.value()),
            ),
            RollupRecord::new(
                MetricType::SessionBytes,
                timeframe,
                timestamp,
                MetricValue::total(self.session_bytes.value()),
            ),
            RollupRecord::new(
                MetricType::SessionDuration,
                timeframe,
                timestamp,
                MetricValue::Count(self.session_duration_secs.value() / SECONDS_PER_HOUR),
            ),
        ]
    }
}

/// Fold session usage reports into the bucket they were reported in
pub fn fold_session_events(
    items: &[SessionEvent],
    exclude: &ExclusionSet,
) -> Result<BucketMaps<SessionEventStatistics>> {
    log::info!("📊 StatisticsFromSessionEvents: {} events", items.len());

    let mut buckets = BucketMaps::<SessionEventStatistics>::new();
    let mut skipped = 0usize;
    for item in items {
        if exclude.contains(&item.acc_address) {
            skipped += 1;
            continue;
        }

        let timestamp = required_timestamp("session_events", item.id, item.timestamp)?;
        non_negative("session_events", item.id, "duration", item.duration_secs)?;
        let bytes = &item.upload_bytes + &item.download_bytes;

        buckets.at_point(timestamp, |s| {
            s.update_session.incr("update_session")?;
            s.session_bytes.add(&bytes);
            s.session_duration_secs
                .add(item.duration_secs, "session_duration")
        })?;
    }

    if skipped > 0 {
        log::debug!("   └─ Excluded {} session events", skipped);
    }

    Ok(buckets)
}
