//! Fan-out over the six entity sources
//!
//! One task per source reads its collection and folds it into bucket maps
//! it owns outright. The join loop is the barrier: the first failure aborts
//! the remaining tasks and is returned tagged with its source, with no
//! partial output.
//! Flattening happens after every task has finished.

use super::buckets::RecordSource;
use super::exclusion::ExclusionSet;
use super::folders::{
    fold_node_events, fold_nodes, fold_session_events, fold_sessions, fold_subscription_payouts,
    fold_subscriptions,
};
use super::types::{RollupRecord, SourceKind, TimeBounds};
use crate::error::{Result, StatisticsError};
use crate::store::SourceStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Read one source and fold it
async fn fold_source(
    kind: SourceKind,
    store: &dyn SourceStore,
    bounds: &TimeBounds,
    exclude: &ExclusionSet,
) -> Result<Box<dyn RecordSource>> {
    let folded: Box<dyn RecordSource> = match kind {
        SourceKind::Nodes => Box::new(fold_nodes(&store.find_nodes().await?)?),
        SourceKind::NodeEvents => Box::new(fold_node_events(&store.find_node_events().await?)?),
        SourceKind::SessionEvents => Box::new(fold_session_events(
            &store.find_session_events().await?,
            exclude,
        )?),
        SourceKind::Sessions => {
            Box::new(fold_sessions(&store.find_sessions().await?, bounds, exclude)?)
        }
        SourceKind::Subscriptions => Box::new(fold_subscriptions(
            &store.find_subscriptions().await?,
            bounds,
            exclude,
        )?),
        SourceKind::SubscriptionPayouts => Box::new(fold_subscription_payouts(
            &store.find_subscription_payouts().await?,
        )?),
    };
    Ok(folded)
}

/// Run every folder concurrently and flatten their buckets into records
pub async fn aggregate(
    store: Arc<dyn SourceStore>,
    bounds: TimeBounds,
    exclude: Arc<ExclusionSet>,
) -> Result<Vec<RollupRecord>> {
    let started = Instant::now();
    let mut tasks = JoinSet::new();
    let mut kinds = HashMap::new();

    for kind in SourceKind::all() {
        let store = Arc::clone(&store);
        let exclude = Arc::clone(&exclude);
        let handle = tasks.spawn(async move {
            fold_source(kind, store.as_ref(), &bounds, &exclude)
                .await
                .map(|folded| (kind, folded))
                .map_err(|e| e.in_folder(kind))
        });
        kinds.insert(handle.id(), kind);
    }

    let mut folded = Vec::with_capacity(SourceKind::all().len());
    while let Some(joined) = tasks.join_next_with_id().await {
        let outcome = match joined {
            Ok((_, outcome)) => outcome,
            // a panicked task still names its source
            Err(e) => {
                let kind = kinds.get(&e.id()).copied();
                let error = StatisticsError::from(e);
                Err(match kind {
                    Some(kind) => error.in_folder(kind),
                    None => error,
                })
            }
        };
        match outcome {
            Ok((kind, buckets)) => {
                log::debug!("   ├─ {}: {} buckets", kind, buckets.bucket_count());
                folded.push(buckets);
            }
            Err(e) => {
                tasks.abort_all();
                log::error!("❌ Aggregation aborted: {}", e);
                return Err(e);
            }
        }
    }

    let records: Vec<RollupRecord> = folded
        .into_iter()
        .flat_map(|buckets| buckets.into_records())
        .collect();

    log::info!(
        "📊 Aggregated {} records from {} sources in {:?}",
        records.len(),
        SourceKind::all().len(),
        started.elapsed()
    );

    Ok(records)
}
