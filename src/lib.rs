//! Periodic statistics rollup for the Sentinel explorer
//!
//! The `statistics` binary runs [`StatisticsJob`] once against the explorer's
//! SQLite database and replaces the published `statistics` snapshot.

pub mod config;
pub mod error;
pub mod rollup;
pub mod sqlite_pragma;
pub mod store;

pub use config::StatisticsConfig;
pub use error::{Result, StatisticsError};
pub use rollup::{JobError, JobReport, JobState, StatisticsJob};
pub use store::{SnapshotPublisher, SourceStore, SqliteStore, StatisticFilter};
