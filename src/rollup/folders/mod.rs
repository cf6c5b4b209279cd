//! Per-source folders
//!
//! One folding function per raw entity source. Each takes a snapshot of its
//! entities, the time bounds and the exclusion set, and returns per-timeframe
//! bucket maps. Folders never share state with each other.
//!
//! Point entities (node registration, node status change, session usage
//! report, payout) land in the bucket containing their timestamp. Interval
//! entities (sessions, subscriptions) are counted as active in every bucket
//! between their start and end; unset endpoints are replaced by the bounds,
//! and edge effects only fire for endpoints that are actually set.

pub mod node;
pub mod node_event;
pub mod payout;
pub mod session;
pub mod session_event;
pub mod subscription;

pub use node::{fold_nodes, NodeStatistics};
pub use node_event::{fold_node_events, NodeEventStatistics};
pub use payout::{fold_subscription_payouts, PayoutStatistics};
pub use session::{fold_sessions, SessionStatistics};
pub use session_event::{fold_session_events, SessionEventStatistics};
pub use subscription::{fold_subscriptions, SubscriptionStatistics};

use super::types::TimeBounds;
use crate::error::{Result, StatisticsError};
use chrono::{DateTime, Utc};

/// Interval endpoints after substituting the bounds for unset values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub has_start: bool,
    pub has_end: bool,
}

impl Interval {
    pub fn resolve(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        bounds: &TimeBounds,
    ) -> Self {
        Self {
            start: start.unwrap_or(bounds.min),
            end: end.unwrap_or(bounds.max),
            has_start: start.is_some(),
            has_end: end.is_some(),
        }
    }
}

/// Point entities must carry a timestamp
pub(crate) fn required_timestamp(
    collection: &'static str,
    id: impl ToString,
    timestamp: Option<DateTime<Utc>>,
) -> Result<DateTime<Utc>> {
    timestamp.ok_or_else(|| StatisticsError::malformed(collection, id, "missing timestamp"))
}

/// Quotas and durations are stored signed but must not be negative
pub(crate) fn non_negative(
    collection: &'static str,
    id: impl ToString,
    field: &str,
    value: i64,
) -> Result<u64> {
    u64::try_from(value).map_err(|_| {
        StatisticsError::malformed(collection, id, format!("negative {}: {}", field, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_interval_substitution() {
        let bounds = TimeBounds::up_to(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap());
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();

        let open = Interval::resolve(Some(start), None, &bounds);
        assert_eq!(open.start, start);
        assert_eq!(open.end, bounds.max);
        assert!(open.has_start);
        assert!(!open.has_end);

        let unstarted = Interval::resolve(None, Some(start), &bounds);
        assert_eq!(unstarted.start, DateTime::UNIX_EPOCH);
        assert!(!unstarted.has_start);
        assert!(unstarted.has_end);
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative("subscriptions", 1, "hours", 5).unwrap(), 5);
        assert!(matches!(
            non_negative("subscriptions", 1, "hours", -1),
            Err(StatisticsError::MalformedEntity { .. })
        ));
    }
}
