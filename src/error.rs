//! Error types for the statistics job

use crate::rollup::job::JobState;
use crate::rollup::types::SourceKind;

/// Errors raised while reading sources, folding entities or publishing the snapshot
#[derive(Debug, thiserror::Error)]
pub enum StatisticsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Malformed {collection} entity {id}: {reason}")]
    MalformedEntity {
        collection: &'static str,
        id: String,
        reason: String,
    },

    #[error("Counter overflow in {metric}")]
    CounterOverflow { metric: &'static str },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Invalid configuration value: {0}")]
    Config(String),

    #[error("Job already ran (state: {0})")]
    AlreadyRan(JobState),

    #[error("{source_kind} folder failed: {error}")]
    Folder {
        source_kind: SourceKind,
        #[source]
        error: Box<StatisticsError>,
    },
}

impl StatisticsError {
    pub fn malformed(collection: &'static str, id: impl ToString, reason: impl Into<String>) -> Self {
        StatisticsError::MalformedEntity {
            collection,
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Attach the failing source to an error raised inside a folder task
    pub fn in_folder(self, source_kind: SourceKind) -> Self {
        StatisticsError::Folder {
            source_kind,
            error: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, StatisticsError>;
