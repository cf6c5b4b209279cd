use super::Interval;
use crate::error::Result;
use crate::rollup::buckets::{Accumulator, BucketMaps};
use crate::rollup::calendar::Timeframe;
use crate::rollup::exclusion::ExclusionSet;
use crate::rollup::numeric::{CoinVector, Counter};
use crate::rollup::types::{MetricType, MetricValue, RollupRecord, Session, TimeBounds};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct SessionStatistics {
    pub active_session: Counter,
    pub start_session: Counter,
    pub end_session: Counter,
    pub session_payment: CoinVector,
    pub session_staking_reward: CoinVector,
}

impl Accumulator for SessionStatistics {
    fn records(&self, timeframe: Timeframe, timestamp: DateTime<Utc>) -> Vec<RollupRecord> {
        let record = |metric, value| RollupRecord::new(metric, timeframe, timestamp, value);
        vec![
            record(
                MetricType::ActiveSession,
                MetricValue::Count(self.active_session.value()),
            ),
            record(
                MetricType::StartSession,
                MetricValue::Count(self.start_session.value()),
            ),
            record(
                MetricType::EndSession,
                MetricValue::Count(self.end_session.value()),
            ),
            record(
                MetricType::SessionPayment,
                MetricValue::coins(&self.session_payment),
            ),
            record(
                MetricType::SessionStakingReward,
                MetricValue::coins(&self.session_staking_reward),
            ),
        ]
    }
}

/// Fold sessions: occupancy across their lifetime, start/end counts on the
/// edges, and settlement (payment, staking reward) on the end edge
pub fn fold_sessions(
    items: &[Session],
    bounds: &TimeBounds,
    exclude: &ExclusionSet,
) -> Result<BucketMaps<SessionStatistics>> {
    log::info!(
        "📊 StatisticsFromSessions: {} sessions ({} .. {})",
        items.len(),
        bounds.min,
        bounds.max
    );

    let mut buckets = BucketMaps::<SessionStatistics>::new();
    for item in items {
        if exclude.contains(&item.acc_address) {
            continue;
        }

        let interval = Interval::resolve(item.start_timestamp, item.end_timestamp, bounds);

        buckets.across_span(interval.start, interval.end, |s| {
            s.active_session.incr("active_session")
        })?;

        if interval.has_start {
            buckets.at_point(interval.start, |s| s.start_session.incr("start_session"))?;
        }

        if interval.has_end {
            buckets.at_point(interval.end, |s| {
                s.session_payment.add(item.payment.as_ref());
                s.session_staking_reward.add(item.staking_reward.as_ref());
                s.end_session.incr("end_session")
            })?;
        }
    }

    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use num_bigint::BigUint;

    fn at(m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, d, 15, 30, 0).unwrap()
    }

    fn day(m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, d, 0, 0, 0).unwrap()
    }

    fn session(id: i64, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Session {
        Session {
            id,
            subscription_id: Some(1),
            acc_address: "sent1user".to_string(),
            node_address: "sentnode1a".to_string(),
            payment: Some(CoinVector::from_pairs([("udvpn", 25)])),
            staking_reward: None,
            start_timestamp: start,
            end_timestamp: end,
        }
    }

    #[test]
    fn test_closed_session() {
        let bounds = TimeBounds::up_to(at(4, 30));
        let items = vec![session(1, Some(at(4, 1)), Some(at(4, 4)))];

        let buckets = fold_sessions(&items, &bounds, &ExclusionSet::default()).unwrap();

        for d in 1..=4 {
            assert_eq!(buckets.get(Timeframe::Day, day(4, d)).unwrap().active_session.value(), 1);
        }
        assert!(buckets.get(Timeframe::Day, day(4, 5)).is_none());

        let first = buckets.get(Timeframe::Day, day(4, 1)).unwrap();
        assert_eq!(first.start_session.value(), 1);
        assert_eq!(first.end_session.value(), 0);
        assert!(first.session_payment.is_empty());

        let last = buckets.get(Timeframe::Day, day(4, 4)).unwrap();
        assert_eq!(last.end_session.value(), 1);
        assert_eq!(last.session_payment.amount_of("udvpn"), BigUint::from(25u32));
        assert!(last.session_staking_reward.is_empty());
    }

    #[test]
    fn test_open_session_has_no_end_edge() {
        let bounds = TimeBounds::up_to(at(4, 10));
        let items = vec![session(1, Some(at(4, 8)), None)];

        let buckets = fold_sessions(&items, &bounds, &ExclusionSet::default()).unwrap();

        let upper = buckets.get(Timeframe::Day, day(4, 10)).unwrap();
        assert_eq!(upper.active_session.value(), 1);
        assert_eq!(upper.end_session.value(), 0);
        assert!(upper.session_payment.is_empty());

        let month = buckets.get(Timeframe::Month, day(4, 1)).unwrap();
        assert_eq!(month.end_session.value(), 0);
        assert_eq!(month.start_session.value(), 1);
    }

    #[test]
    fn test_excluded_session_is_dropped() {
        let bounds = TimeBounds::up_to(at(4, 10));
        let mut item = session(1, Some(at(4, 8)), Some(at(4, 9)));
        item.acc_address = "sent1system".to_string();

        let buckets = fold_sessions(&[item], &bounds, &ExclusionSet::new(["sent1system"])).unwrap();
        assert_eq!(buckets.bucket_count(), 0);
    }
}
