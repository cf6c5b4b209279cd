use super::{non_negative, required_timestamp};
use crate::error::Result;
use crate::rollup::buckets::{Accumulator, BucketMaps};
use crate::rollup::calendar::Timeframe;
use crate::rollup::numeric::{CoinVector, Counter};
use crate::rollup::types::{MetricType, MetricValue, RollupRecord, SubscriptionPayout};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct PayoutStatistics {
    pub subscription_payout: Counter,
    pub subscription_payout_hours: Counter,
    pub subscription_payout_amount: CoinVector,
}

impl Accumulator for PayoutStatistics {
    fn records(&self, timeframe: Timeframe, timestamp: DateTime<Utc>) -> Vec<RollupRecord> {
        vec![
            RollupRecord::new(
                MetricType::SubscriptionPayout,
                timeframe,
                timestamp,
                MetricValue::Count(self.subscription_payout.value()),
            ),
            RollupRecord::new(
                MetricType::SubscriptionPayoutHours,
                timeframe,
                timestamp,
                MetricValue::Count(self.subscription_payout_hours.value()),
            ),
            RollupRecord::new(
                MetricType::SubscriptionPayoutAmount,
                timeframe,
                timestamp,
                MetricValue::coins(&self.subscription_payout_amount),
            ),
        ]
    }
}

/// Fold hourly subscription payouts to nodes
pub fn fold_subscription_payouts(
    items: &[SubscriptionPayout],
) -> Result<BucketMaps<PayoutStatistics>> {
    log::info!("📊 StatisticsFromSubscriptionPayouts: {} payouts", items.len());

    let mut buckets = BucketMaps::<PayoutStatistics>::new();
    for item in items {
        let timestamp = required_timestamp("subscription_payouts", item.id, item.timestamp)?;
        non_negative("subscription_payouts", item.id, "hours", item.hours)?;

        buckets.at_point(timestamp, |s| {
            s.subscription_payout.incr("subscription_payout")?;
            s.subscription_payout_hours
                .add(item.hours, "subscription_payout_hours")?;
            s.subscription_payout_amount.add(item.amount.as_ref());
            Ok(())
        })?;
    }

    Ok(buckets)
}
