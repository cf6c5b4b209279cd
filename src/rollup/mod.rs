//! Statistics rollup engine
//!
//! Reads the raw explorer collections, folds them into calendar buckets
//! (day, ISO week, month, year) and hands the flat record set to the
//! publisher.
//!
//! Layout:
//! - `calendar` - bucket start and successor per timeframe
//! - `numeric` - overflow-checked counters, unbounded totals, coin vectors
//! - `buckets` - per-timeframe accumulator maps
//! - `folders` - one folding function per entity source
//! - `coordinator` - concurrent fan-out over the folders
//! - `job` - the batch state machine

pub mod buckets;
pub mod calendar;
pub mod coordinator;
pub mod exclusion;
pub mod folders;
pub mod job;
pub mod numeric;
pub mod types;

pub use calendar::Timeframe;
pub use coordinator::aggregate;
pub use exclusion::ExclusionSet;
pub use job::{JobError, JobReport, JobState, StatisticsJob};
pub use types::{MetricType, MetricValue, RollupRecord, SourceKind, TimeBounds};
