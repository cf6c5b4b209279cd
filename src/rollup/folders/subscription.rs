use super::{non_negative, Interval};
use crate::error::Result;
use crate::rollup::buckets::{Accumulator, BucketMaps};
use crate::rollup::calendar::Timeframe;
use crate::rollup::exclusion::ExclusionSet;
use crate::rollup::numeric::{bytes_per_gigabyte, BigTotal, CoinVector, Counter};
use crate::rollup::types::{MetricType, MetricValue, RollupRecord, Subscription, TimeBounds};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct SubscriptionStatistics {
    pub active_subscription: Counter,
    pub bytes_subscription: Counter,
    pub end_subscription: Counter,
    pub hours_subscription: Counter,
    pub plan_payment: CoinVector,
    pub plan_staking_reward: CoinVector,
    pub plan_subscription: Counter,
    pub start_subscription: Counter,
    pub subscription_bytes: BigTotal,
    pub subscription_deposit: CoinVector,
    pub subscription_hours: Counter,
    pub subscription_refund: CoinVector,
}

impl Accumulator for SubscriptionStatistics {
    fn records(&self, timeframe: Timeframe, timestamp: DateTime<Utc>) -> Vec<RollupRecord> {
        let record = |metric, value| RollupRecord::new(metric, timeframe, timestamp, value);
        let count = |counter: &Counter| MetricValue::Count(counter.value());
        vec![
            record(MetricType::ActiveSubscription, count(&self.active_subscription)),
            record(MetricType::BytesSubscription, count(&self.bytes_subscription)),
            record(MetricType::EndSubscription, count(&self.end_subscription)),
            record(MetricType::HoursSubscription, count(&self.hours_subscription)),
            record(MetricType::PlanPayment, MetricValue::coins(&self.plan_payment)),
            record(
                MetricType::PlanStakingReward,
                MetricValue::coins(&self.plan_staking_reward),
            ),
            record(MetricType::PlanSubscription, count(&self.plan_subscription)),
            record(MetricType::StartSubscription, count(&self.start_subscription)),
            record(
                MetricType::SubscriptionBytes,
                MetricValue::total(self.subscription_bytes.value()),
            ),
            record(
                MetricType::SubscriptionDeposit,
                MetricValue::coins(&self.subscription_deposit),
            ),
            record(MetricType::SubscriptionHours, count(&self.subscription_hours)),
            record(
                MetricType::SubscriptionRefund,
                MetricValue::coins(&self.subscription_refund),
            ),
        ]
    }
}

/// Fold subscriptions across the bucket grid
///
/// Per subscription:
/// - `active_subscription` in every bucket from start through end (open ends
///   run to `bounds.max`, unset starts from `bounds.min`)
/// - deposit, plan payment, staking reward, quota counts and totals on the
///   start bucket
/// - `start_subscription` only when a start timestamp is recorded
/// - `end_subscription` and the refund only when an end timestamp is recorded
pub fn fold_subscriptions(
    items: &[Subscription],
    bounds: &TimeBounds,
    exclude: &ExclusionSet,
) -> Result<BucketMaps<SubscriptionStatistics>> {
    log::info!(
        "📊 StatisticsFromSubscriptions: {} subscriptions ({} .. {})",
        items.len(),
        bounds.min,
        bounds.max
    );

    let gigabyte = bytes_per_gigabyte();
    let mut buckets = BucketMaps::<SubscriptionStatistics>::new();

    for item in items {
        if exclude.contains(&item.acc_address) {
            continue;
        }

        let gigabytes = non_negative("subscriptions", item.id, "gigabytes", item.gigabytes)?;
        non_negative("subscriptions", item.id, "hours", item.hours)?;

        let interval = Interval::resolve(item.start_timestamp, item.end_timestamp, bounds);

        buckets.across_span(interval.start, interval.end, |s| {
            s.active_subscription.incr("active_subscription")
        })?;

        buckets.at_point(interval.start, |s| {
            if interval.has_start {
                s.start_subscription.incr("start_subscription")?;
            }
            s.subscription_deposit.add(item.deposit.as_ref());
            s.plan_payment.add(item.payment.as_ref());
            s.plan_staking_reward.add(item.staking_reward.as_ref());
            if gigabytes != 0 {
                s.bytes_subscription.incr("bytes_subscription")?;
                s.subscription_bytes.add_scaled(gigabytes, &gigabyte);
            }
            if item.hours != 0 {
                s.hours_subscription.incr("hours_subscription")?;
                s.subscription_hours.add(item.hours, "subscription_hours")?;
            }
            if item.plan_id != 0 {
                s.plan_subscription.incr("plan_subscription")?;
            }
            Ok(())
        })?;

        if interval.has_end {
            buckets.at_point(interval.end, |s| {
                s.subscription_refund.add(item.refund.as_ref());
                s.end_subscription.incr("end_subscription")
            })?;
        }
    }

    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatisticsError;
    use chrono::TimeZone;
    use num_bigint::BigUint;

    fn day(m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, d, 0, 0, 0).unwrap()
    }

    fn subscription(id: i64) -> Subscription {
        Subscription {
            id,
            acc_address: "sent1user".to_string(),
            node_address: None,
            plan_id: 0,
            gigabytes: 0,
            hours: 0,
            deposit: None,
            refund: None,
            payment: None,
            staking_reward: None,
            start_timestamp: None,
            end_timestamp: None,
        }
    }

    #[test]
    fn test_interval_coverage() {
        let bounds = TimeBounds::up_to(day(12, 31));
        let mut item = subscription(1);
        item.start_timestamp = Some(day(5, 14));
        item.end_timestamp = Some(day(5, 17));

        let buckets = fold_subscriptions(&[item], &bounds, &ExclusionSet::default()).unwrap();

        let active = |timeframe, start| {
            buckets
                .get(timeframe, start)
                .map(|s: &SubscriptionStatistics| s.active_subscription.value())
        };
        for d in 14..=17 {
            assert_eq!(active(Timeframe::Day, day(5, d)), Some(1));
        }
        assert_eq!(active(Timeframe::Day, day(5, 13)), None);
        assert_eq!(active(Timeframe::Day, day(5, 18)), None);
        assert_eq!(active(Timeframe::Week, day(5, 13)), Some(1));
        assert_eq!(active(Timeframe::Month, day(5, 1)), Some(1));
        assert_eq!(active(Timeframe::Year, day(1, 1)), Some(1));
        assert_eq!(buckets.bucket_count(), 4 + 1 + 1 + 1);
    }

    #[test]
    fn test_gigabyte_quota() {
        let bounds = TimeBounds::up_to(day(12, 31));
        let mut item = subscription(1);
        item.start_timestamp = Some(day(2, 1));
        item.end_timestamp = Some(day(2, 2));
        item.gigabytes = 1_000_000_000_000;

        let buckets = fold_subscriptions(&[item], &bounds, &ExclusionSet::default()).unwrap();
        let start = buckets.get(Timeframe::Day, day(2, 1)).unwrap();

        assert_eq!(start.bytes_subscription.value(), 1);
        assert_eq!(start.subscription_bytes.to_string(), "1000000000000000000000");
        assert_eq!(start.hours_subscription.value(), 0);

        let end = buckets.get(Timeframe::Day, day(2, 2)).unwrap();
        assert_eq!(end.bytes_subscription.value(), 0);
        assert_eq!(end.subscription_bytes.value(), &BigUint::from(0u8));
    }

    #[test]
    fn test_hour_quota_registers_no_bytes() {
        let bounds = TimeBounds::up_to(day(12, 31));
        let mut item = subscription(1);
        item.start_timestamp = Some(day(2, 1));
        item.hours = 720;
        item.plan_id = 3;
        item.payment = Some(CoinVector::from_pairs([("udvpn", 9)]));

        let buckets = fold_subscriptions(&[item], &bounds, &ExclusionSet::default()).unwrap();
        let start = buckets.get(Timeframe::Month, day(2, 1)).unwrap();

        assert_eq!(start.hours_subscription.value(), 1);
        assert_eq!(start.subscription_hours.value(), 720);
        assert_eq!(start.bytes_subscription.value(), 0);
        assert_eq!(start.plan_subscription.value(), 1);
        assert_eq!(start.plan_payment.amount_of("udvpn"), BigUint::from(9u8));
    }

    #[test]
    fn test_open_subscription_runs_to_upper_bound_without_end_event() {
        let bounds = TimeBounds::up_to(day(3, 10));
        let mut item = subscription(1);
        item.start_timestamp = Some(day(3, 8));
        item.refund = Some(CoinVector::from_pairs([("udvpn", 1)]));

        let buckets = fold_subscriptions(&[item], &bounds, &ExclusionSet::default()).unwrap();

        assert_eq!(
            buckets.get(Timeframe::Day, day(3, 10)).unwrap().active_subscription.value(),
            1
        );
        assert!(buckets.get(Timeframe::Day, day(3, 11)).is_none());
        for timeframe in Timeframe::all() {
            let start = timeframe.bucket_start(day(3, 10));
            let stats = buckets.get(timeframe, start).unwrap();
            assert_eq!(stats.end_subscription.value(), 0);
            assert!(stats.subscription_refund.is_empty());
        }
    }

    #[test]
    fn test_present_but_empty_deposit_adds_nothing() {
        let bounds = TimeBounds::up_to(day(3, 10));
        let mut item = subscription(1);
        item.start_timestamp = Some(day(3, 8));
        item.end_timestamp = Some(day(3, 8));
        item.deposit = Some(CoinVector::new());

        let buckets = fold_subscriptions(&[item], &bounds, &ExclusionSet::default()).unwrap();
        let stats = buckets.get(Timeframe::Day, day(3, 8)).unwrap();

        assert!(stats.subscription_deposit.is_empty());
        assert_eq!(stats.start_subscription.value(), 1);
        assert_eq!(stats.end_subscription.value(), 1);
    }

    #[test]
    fn test_exclusion_removes_all_contributions() {
        let bounds = TimeBounds::up_to(day(3, 10));
        let mut excluded = subscription(1);
        excluded.acc_address = "sent1c4nvz43tlw6d0c9nfu6r957y5d9pgjk5czl3n3".to_string();
        excluded.start_timestamp = Some(day(3, 1));
        excluded.deposit = Some(CoinVector::from_pairs([("udvpn", 100)]));
        let mut kept = subscription(2);
        kept.start_timestamp = Some(day(3, 5));
        kept.end_timestamp = Some(day(3, 5));

        let exclude = ExclusionSet::new(["sent1c4nvz43tlw6d0c9nfu6r957y5d9pgjk5czl3n3"]);
        let buckets = fold_subscriptions(&[excluded, kept], &bounds, &exclude).unwrap();

        assert_eq!(buckets.bucket_count(), 4);
        assert!(buckets.get(Timeframe::Day, day(3, 1)).is_none());
        let month = buckets.get(Timeframe::Month, day(3, 1)).unwrap();
        assert_eq!(month.active_subscription.value(), 1);
        assert!(month.subscription_deposit.is_empty());
    }

    #[test]
    fn test_three_subscriptions_in_january() {
        let bounds = TimeBounds {
            min: day(1, 1),
            max: day(1, 31),
        };
        let mut a = subscription(1);
        a.start_timestamp = Some(day(1, 1));
        a.end_timestamp = Some(day(1, 2));
        a.deposit = Some(CoinVector::from_pairs([("usent", 100)]));
        let mut b = subscription(2);
        b.start_timestamp = Some(day(1, 15));
        let mut c = subscription(3);
        c.end_timestamp = Some(day(1, 20));
        c.refund = Some(CoinVector::from_pairs([("usent", 50)]));

        let buckets = fold_subscriptions(&[a, b, c], &bounds, &ExclusionSet::default()).unwrap();
        let on = |d| buckets.get(Timeframe::Day, day(1, d)).unwrap();

        // C runs from the lower bound, so it overlaps A as well as B
        assert_eq!(on(1).active_subscription.value(), 2);
        assert_eq!(on(2).active_subscription.value(), 2);
        assert_eq!(on(3).active_subscription.value(), 1);
        assert_eq!(on(15).active_subscription.value(), 2);
        assert_eq!(on(21).active_subscription.value(), 1);

        assert_eq!(on(1).subscription_deposit.amount_of("usent"), BigUint::from(100u32));
        assert_eq!(on(1).start_subscription.value(), 1);
        assert_eq!(on(20).subscription_refund.amount_of("usent"), BigUint::from(50u32));
        assert_eq!(on(20).end_subscription.value(), 1);
        assert_eq!(on(31).end_subscription.value(), 0);

        let january = buckets.get(Timeframe::Month, day(1, 1)).unwrap();
        assert_eq!(january.active_subscription.value(), 3);
        assert_eq!(january.start_subscription.value(), 2);
        assert_eq!(january.end_subscription.value(), 2);
    }

    #[test]
    fn test_negative_quota_is_fatal() {
        let bounds = TimeBounds::up_to(day(3, 10));
        let mut item = subscription(9);
        item.gigabytes = -1;

        let err = fold_subscriptions(&[item], &bounds, &ExclusionSet::default()).unwrap_err();
        assert!(matches!(
            err,
            StatisticsError::MalformedEntity { collection: "subscriptions", .. }
        ));
    }
}
