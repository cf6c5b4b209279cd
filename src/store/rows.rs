//! Row decoding for the raw entity tables
//!
//! Column conventions:
//! - timestamps are Unix seconds, `NULL` or `0` meaning unset
//! - token amounts are JSON coin arrays, `NULL` meaning absent
//! - byte counts are decimal strings
//!
//! Anything that does not decode is a malformed entity and fails the run.

use crate::error::{Result, StatisticsError};
use crate::rollup::calendar::Timeframe;
use crate::rollup::numeric::CoinVector;
use crate::rollup::types::{
    Block, MetricType, MetricValue, Node, NodeEvent, NodeStatus, RollupRecord, Session,
    SessionEvent, Subscription, SubscriptionPayout,
};
use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use rusqlite::Row;
use std::str::FromStr;

pub const SELECT_NODES: &str = "SELECT address, register_timestamp FROM nodes";

pub const SELECT_NODE_EVENTS: &str =
    "SELECT id, node_address, status, timestamp FROM node_events";

pub const SELECT_SESSION_EVENTS: &str = "SELECT id, session_id, acc_address, node_address,
        upload_bytes, download_bytes, duration_secs, timestamp
     FROM session_events";

pub const SELECT_SESSIONS: &str = "SELECT id, subscription_id, acc_address, node_address,
        payment, staking_reward, start_timestamp, end_timestamp
     FROM sessions";

pub const SELECT_SUBSCRIPTIONS: &str = "SELECT id, acc_address, node_address, plan_id,
        gigabytes, hours, deposit, refund, payment, staking_reward,
        start_timestamp, end_timestamp
     FROM subscriptions";

pub const SELECT_SUBSCRIPTION_PAYOUTS: &str =
    "SELECT id, subscription_id, node_address, hours, amount, timestamp
     FROM subscription_payouts";

pub const SELECT_LATEST_BLOCK: &str =
    "SELECT height, time FROM blocks ORDER BY height DESC LIMIT 1";

fn timestamp(
    collection: &'static str,
    id: &dyn ToString,
    secs: Option<i64>,
) -> Result<Option<DateTime<Utc>>> {
    match secs {
        None | Some(0) => Ok(None),
        Some(secs) => DateTime::from_timestamp(secs, 0).map(Some).ok_or_else(|| {
            let reason = format!("timestamp out of range: {}", secs);
            StatisticsError::malformed(collection, id.to_string(), reason)
        }),
    }
}

fn coins(
    collection: &'static str,
    id: &dyn ToString,
    field: &str,
    json: Option<String>,
) -> Result<Option<CoinVector>> {
    json.map(|json| {
        CoinVector::parse(&json).map_err(|reason| {
            let reason = format!("{}: {}", field, reason);
            StatisticsError::malformed(collection, id.to_string(), reason)
        })
    })
    .transpose()
}

fn byte_count(collection: &'static str, id: i64, field: &str, value: &str) -> Result<BigUint> {
    BigUint::from_str(value.trim()).map_err(|_| {
        let reason = format!("{}: not a byte count: {:?}", field, value);
        StatisticsError::malformed(collection, id, reason)
    })
}

pub fn node(row: &Row) -> Result<Node> {
    let address: String = row.get(0)?;
    let register_timestamp = timestamp("nodes", &address, row.get(1)?)?;
    Ok(Node {
        address,
        register_timestamp,
    })
}

pub fn node_event(row: &Row) -> Result<NodeEvent> {
    let id: i64 = row.get(0)?;
    let status: String = row.get(2)?;
    let status = NodeStatus::from_str(&status).ok_or_else(|| {
        StatisticsError::malformed("node_events", id, format!("unknown status: {}", status))
    })?;

    Ok(NodeEvent {
        id,
        node_address: row.get(1)?,
        status,
        timestamp: timestamp("node_events", &id, row.get(3)?)?,
    })
}

pub fn session_event(row: &Row) -> Result<SessionEvent> {
    let id: i64 = row.get(0)?;
    let upload: String = row.get(4)?;
    let download: String = row.get(5)?;

    Ok(SessionEvent {
        id,
        session_id: row.get(1)?,
        acc_address: row.get(2)?,
        node_address: row.get(3)?,
        upload_bytes: byte_count("session_events", id, "upload_bytes", &upload)?,
        download_bytes: byte_count("session_events", id, "download_bytes", &download)?,
        duration_secs: row.get(6)?,
        timestamp: timestamp("session_events", &id, row.get(7)?)?,
    })
}

pub fn session(row: &Row) -> Result<Session> {
    let id: i64 = row.get(0)?;
    Ok(Session {
        id,
        subscription_id: row.get(1)?,
        acc_address: row.get(2)?,
        node_address: row.get(3)?,
        payment: coins("sessions", &id, "payment", row.get(4)?)?,
        staking_reward: coins("sessions", &id, "staking_reward", row.get(5)?)?,
        start_timestamp: timestamp("sessions", &id, row.get(6)?)?,
        end_timestamp: timestamp("sessions", &id, row.get(7)?)?,
    })
}

pub fn subscription(row: &Row) -> Result<Subscription> {
    let id: i64 = row.get(0)?;
    Ok(Subscription {
        id,
        acc_address: row.get(1)?,
        node_address: row.get(2)?,
        plan_id: row.get(3)?,
        gigabytes: row.get(4)?,
        hours: row.get(5)?,
        deposit: coins("subscriptions", &id, "deposit", row.get(6)?)?,
        refund: coins("subscriptions", &id, "refund", row.get(7)?)?,
        payment: coins("subscriptions", &id, "payment", row.get(8)?)?,
        staking_reward: coins("subscriptions", &id, "staking_reward", row.get(9)?)?,
        start_timestamp: timestamp("subscriptions", &id, row.get(10)?)?,
        end_timestamp: timestamp("subscriptions", &id, row.get(11)?)?,
    })
}

pub fn subscription_payout(row: &Row) -> Result<SubscriptionPayout> {
    let id: i64 = row.get(0)?;
    Ok(SubscriptionPayout {
        id,
        subscription_id: row.get(1)?,
        node_address: row.get(2)?,
        hours: row.get(3)?,
        amount: coins("subscription_payouts", &id, "amount", row.get(4)?)?,
        timestamp: timestamp("subscription_payouts", &id, row.get(5)?)?,
    })
}

pub fn block(row: &Row) -> Result<Block> {
    let height: i64 = row.get(0)?;
    let secs: i64 = row.get(1)?;
    let time = timestamp("blocks", &height, Some(secs))?
        .ok_or_else(|| StatisticsError::malformed("blocks", height, "missing block time"))?;
    Ok(Block { height, time })
}

/// Published record, as stored in `statistics`
pub fn statistic(row: &Row) -> Result<RollupRecord> {
    let metric: String = row.get(0)?;
    let timeframe: String = row.get(1)?;
    let secs: i64 = row.get(2)?;
    let value: String = row.get(3)?;

    let key = format!("{}/{}/{}", metric, timeframe, secs);
    let metric = MetricType::from_str(&metric)
        .ok_or_else(|| StatisticsError::malformed("statistics", &key, "unknown type"))?;
    let timeframe = Timeframe::from_str(&timeframe)
        .ok_or_else(|| StatisticsError::malformed("statistics", &key, "unknown timeframe"))?;
    let timestamp = DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| StatisticsError::malformed("statistics", &key, "timestamp out of range"))?;
    let value: MetricValue = serde_json::from_str(&value)?;

    Ok(RollupRecord::new(metric, timeframe, timestamp, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn one<T>(sql: &str, decode: fn(&Row) -> Result<T>) -> Result<T> {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare(sql).unwrap();
        let mut rows = stmt.query([]).unwrap();
        let row = rows.next().unwrap().unwrap();
        decode(row)
    }

    #[test]
    fn test_zero_timestamp_is_unset() {
        let zero = one("SELECT 'sentnode1a', 0", node).unwrap();
        assert_eq!(zero.register_timestamp, None);

        let null = one("SELECT 'sentnode1a', NULL", node).unwrap();
        assert_eq!(null.register_timestamp, None);

        let set = one("SELECT 'sentnode1a', 1704067200", node).unwrap();
        assert_eq!(set.register_timestamp.unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_unknown_status_is_malformed() {
        let err = one("SELECT 1, 'sentnode1a', 'paused', 1704067200", node_event).unwrap_err();
        assert!(matches!(err, StatisticsError::MalformedEntity { collection: "node_events", .. }));
    }

    #[test]
    fn test_session_event_byte_strings() {
        let event = one(
            "SELECT 3, 9, 'sent1user', 'sentnode1a', '340282366920938463463374607431768211456', '1', 60, 1704067200",
            session_event,
        )
        .unwrap();
        assert_eq!(
            (&event.upload_bytes + &event.download_bytes).to_string(),
            "340282366920938463463374607431768211457"
        );

        let err = one(
            "SELECT 3, 9, 'sent1user', 'sentnode1a', 'lots', '1', 60, 1704067200",
            session_event,
        )
        .unwrap_err();
        assert!(matches!(err, StatisticsError::MalformedEntity { .. }));
    }

    #[test]
    fn test_subscription_coins() {
        let sub = one(
            r#"SELECT 5, 'sent1user', NULL, 2, 10, 0,
                      '[{"denom":"udvpn","amount":"1000"}]', NULL, '[]', NULL, 1704067200, 0"#,
            subscription,
        )
        .unwrap();
        assert_eq!(sub.deposit.unwrap().amount_of("udvpn"), BigUint::from(1000u32));
        assert!(sub.refund.is_none());
        assert!(sub.payment.unwrap().is_empty());
        assert!(sub.end_timestamp.is_none());

        let err = one(
            r#"SELECT 5, 'sent1user', NULL, 2, 10, 0, 'not json', NULL, NULL, NULL, 0, 0"#,
            subscription,
        )
        .unwrap_err();
        assert!(matches!(err, StatisticsError::MalformedEntity { collection: "subscriptions", .. }));
    }

    #[test]
    fn test_statistic_row() {
        let record = one(
            r#"SELECT 'session_payment', 'month', 1704067200, '{"udvpn":"5"}'"#,
            statistic,
        )
        .unwrap();
        assert_eq!(record.metric, MetricType::SessionPayment);
        assert_eq!(record.timeframe, Timeframe::Month);
        assert_eq!(record.value, MetricValue::coins(&CoinVector::from_pairs([("udvpn", 5)])));
    }
}
