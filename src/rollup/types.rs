//! Core data structures: raw entities read from the store and the rollup
//! records published back to it.

use super::calendar::Timeframe;
use super::numeric::CoinVector;
use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw entity source feeding one folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Nodes,
    NodeEvents,
    SessionEvents,
    Sessions,
    Subscriptions,
    SubscriptionPayouts,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Nodes => "nodes",
            SourceKind::NodeEvents => "node_events",
            SourceKind::SessionEvents => "session_events",
            SourceKind::Sessions => "sessions",
            SourceKind::Subscriptions => "subscriptions",
            SourceKind::SubscriptionPayouts => "subscription_payouts",
        }
    }

    pub fn all() -> [SourceKind; 6] {
        [
            SourceKind::Nodes,
            SourceKind::NodeEvents,
            SourceKind::SessionEvents,
            SourceKind::Sessions,
            SourceKind::Subscriptions,
            SourceKind::SubscriptionPayouts,
        ]
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Published metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricType {
    // nodes
    RegisterNode,
    // node events
    NodeStatusActive,
    NodeStatusInactive,
    // session events
    UpdateSession,
    SessionBytes,
    SessionDuration,
    // sessions
    ActiveSession,
    StartSession,
    EndSession,
    SessionPayment,
    SessionStakingReward,
    // subscriptions
    ActiveSubscription,
    BytesSubscription,
    EndSubscription,
    HoursSubscription,
    PlanPayment,
    PlanStakingReward,
    PlanSubscription,
    StartSubscription,
    SubscriptionBytes,
    SubscriptionDeposit,
    SubscriptionHours,
    SubscriptionRefund,
    // subscription payouts
    SubscriptionPayout,
    SubscriptionPayoutHours,
    SubscriptionPayoutAmount,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::RegisterNode => "register_node",
            MetricType::NodeStatusActive => "node_status_active",
            MetricType::NodeStatusInactive => "node_status_inactive",
            MetricType::UpdateSession => "update_session",
            MetricType::SessionBytes => "session_bytes",
            MetricType::SessionDuration => "session_duration",
            MetricType::ActiveSession => "active_session",
            MetricType::StartSession => "start_session",
            MetricType::EndSession => "end_session",
            MetricType::SessionPayment => "session_payment",
            MetricType::SessionStakingReward => "session_staking_reward",
            MetricType::ActiveSubscription => "active_subscription",
            MetricType::BytesSubscription => "bytes_subscription",
            MetricType::EndSubscription => "end_subscription",
            MetricType::HoursSubscription => "hours_subscription",
            MetricType::PlanPayment => "plan_payment",
            MetricType::PlanStakingReward => "plan_staking_reward",
            MetricType::PlanSubscription => "plan_subscription",
            MetricType::StartSubscription => "start_subscription",
            MetricType::SubscriptionBytes => "subscription_bytes",
            MetricType::SubscriptionDeposit => "subscription_deposit",
            MetricType::SubscriptionHours => "subscription_hours",
            MetricType::SubscriptionRefund => "subscription_refund",
            MetricType::SubscriptionPayout => "subscription_payout",
            MetricType::SubscriptionPayoutHours => "subscription_payout_hours",
            MetricType::SubscriptionPayoutAmount => "subscription_payout_amount",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|m| m.as_str() == s)
    }

    pub fn all() -> [MetricType; 26] {
        [
            MetricType::RegisterNode,
            MetricType::NodeStatusActive,
            MetricType::NodeStatusInactive,
            MetricType::UpdateSession,
            MetricType::SessionBytes,
            MetricType::SessionDuration,
            MetricType::ActiveSession,
            MetricType::StartSession,
            MetricType::EndSession,
            MetricType::SessionPayment,
            MetricType::SessionStakingReward,
            MetricType::ActiveSubscription,
            MetricType::BytesSubscription,
            MetricType::EndSubscription,
            MetricType::HoursSubscription,
            MetricType::PlanPayment,
            MetricType::PlanStakingReward,
            MetricType::PlanSubscription,
            MetricType::StartSubscription,
            MetricType::SubscriptionBytes,
            MetricType::SubscriptionDeposit,
            MetricType::SubscriptionHours,
            MetricType::SubscriptionRefund,
            MetricType::SubscriptionPayout,
            MetricType::SubscriptionPayoutHours,
            MetricType::SubscriptionPayoutAmount,
        ]
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of one rollup record, serialized untagged:
/// a number, a decimal string, or a `{denom: amount}` object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(i64),
    Total(String),
    Coins(BTreeMap<String, String>),
}

impl MetricValue {
    pub fn total(value: &BigUint) -> Self {
        MetricValue::Total(value.to_str_radix(10))
    }

    pub fn coins(coins: &CoinVector) -> Self {
        MetricValue::Coins(coins.to_string_map())
    }

    pub fn as_count(&self) -> Option<i64> {
        match self {
            MetricValue::Count(n) => Some(*n),
            _ => None,
        }
    }
}

/// One published aggregate value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupRecord {
    pub metric: MetricType,
    pub timeframe: Timeframe,
    pub timestamp: DateTime<Utc>,
    pub value: MetricValue,
}

impl RollupRecord {
    pub fn new(
        metric: MetricType,
        timeframe: Timeframe,
        timestamp: DateTime<Utc>,
        value: MetricValue,
    ) -> Self {
        Self {
            metric,
            timeframe,
            timestamp,
            value,
        }
    }
}

/// Lower and upper bounds substituted for unset interval endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    pub min: DateTime<Utc>,
    pub max: DateTime<Utc>,
}

impl TimeBounds {
    /// Lower bound at the Unix epoch
    pub fn up_to(max: DateTime<Utc>) -> Self {
        Self {
            min: DateTime::UNIX_EPOCH,
            max,
        }
    }
}

/// Latest indexed block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub height: i64,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub address: String,
    pub register_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Active,
    Inactive,
}

impl NodeStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(NodeStatus::Active),
            "inactive" => Some(NodeStatus::Inactive),
            _ => None,
        }
    }
}

/// Node status change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEvent {
    pub id: i64,
    pub node_address: String,
    pub status: NodeStatus,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Bandwidth and duration reported for a running session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub id: i64,
    pub session_id: i64,
    pub acc_address: String,
    pub node_address: String,
    pub upload_bytes: BigUint,
    pub download_bytes: BigUint,
    pub duration_secs: i64,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: i64,
    pub subscription_id: Option<i64>,
    pub acc_address: String,
    pub node_address: String,
    pub payment: Option<CoinVector>,
    pub staking_reward: Option<CoinVector>,
    pub start_timestamp: Option<DateTime<Utc>>,
    pub end_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: i64,
    pub acc_address: String,
    pub node_address: Option<String>,
    pub plan_id: i64,
    pub gigabytes: i64,
    pub hours: i64,
    pub deposit: Option<CoinVector>,
    pub refund: Option<CoinVector>,
    pub payment: Option<CoinVector>,
    pub staking_reward: Option<CoinVector>,
    pub start_timestamp: Option<DateTime<Utc>>,
    pub end_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPayout {
    pub id: i64,
    pub subscription_id: i64,
    pub node_address: String,
    pub hours: i64,
    pub amount: Option<CoinVector>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_unique() {
        let mut names: Vec<&str> = MetricType::all().iter().map(|m| m.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), MetricType::all().len());

        for metric in MetricType::all() {
            assert_eq!(MetricType::from_str(metric.as_str()), Some(metric));
        }
    }

    #[test]
    fn test_metric_value_json_shapes() {
        assert_eq!(serde_json::to_string(&MetricValue::Count(3)).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&MetricValue::Total("12".to_string())).unwrap(),
            "\"12\""
        );
        let coins = CoinVector::from_pairs([("usent", 100)]);
        assert_eq!(
            serde_json::to_string(&MetricValue::coins(&coins)).unwrap(),
            r#"{"usent":"100"}"#
        );

        let parsed: MetricValue = serde_json::from_str(r#"{"usent":"100"}"#).unwrap();
        assert_eq!(parsed, MetricValue::coins(&coins));
        let parsed: MetricValue = serde_json::from_str("7").unwrap();
        assert_eq!(parsed.as_count(), Some(7));
    }
}
