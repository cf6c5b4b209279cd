//! Per-timeframe bucket maps
//!
//! Each folder owns one `BucketMaps<A>`: for every timeframe a map from
//! bucket start to accumulator, created zeroed on first touch.

use super::calendar::Timeframe;
use super::types::RollupRecord;
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Metric accumulator for one bucket
pub trait Accumulator: Default + Send {
    /// Every metric this accumulator publishes for the bucket, zeros included
    fn records(&self, timeframe: Timeframe, timestamp: DateTime<Utc>) -> Vec<RollupRecord>;
}

/// Output of a folder, flattened after all folders have finished
pub trait RecordSource: Send {
    fn bucket_count(&self) -> usize;

    fn into_records(self: Box<Self>) -> Vec<RollupRecord>;
}

/// Bucket start instants for one timestamp at every timeframe
#[derive(Debug, Clone, Copy)]
pub struct BucketKeys {
    keys: [(Timeframe, DateTime<Utc>); 4],
}

impl BucketKeys {
    pub fn of(t: DateTime<Utc>) -> Self {
        let keys = Timeframe::all().map(|timeframe| (timeframe, timeframe.bucket_start(t)));
        Self { keys }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Timeframe, DateTime<Utc>)> + '_ {
        self.keys.iter().copied()
    }
}

#[derive(Debug)]
pub struct BucketMaps<A> {
    maps: HashMap<Timeframe, HashMap<DateTime<Utc>, A>>,
}

impl<A: Accumulator> Default for BucketMaps<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Accumulator> BucketMaps<A> {
    pub fn new() -> Self {
        let maps = Timeframe::all()
            .into_iter()
            .map(|timeframe| (timeframe, HashMap::new()))
            .collect();
        Self { maps }
    }

    /// Accumulator for a bucket start, created on first touch
    pub fn entry(&mut self, timeframe: Timeframe, start: DateTime<Utc>) -> &mut A {
        self.maps
            .entry(timeframe)
            .or_default()
            .entry(start)
            .or_default()
    }

    pub fn get(&self, timeframe: Timeframe, start: DateTime<Utc>) -> Option<&A> {
        self.maps.get(&timeframe).and_then(|m| m.get(&start))
    }

    /// Apply `f` to the bucket containing `t` at every timeframe
    pub fn at_point<F>(&mut self, t: DateTime<Utc>, mut f: F) -> Result<()>
    where
        F: FnMut(&mut A) -> Result<()>,
    {
        for (timeframe, start) in BucketKeys::of(t).iter() {
            f(self.entry(timeframe, start))?;
        }
        Ok(())
    }

    /// Apply `f` to every bucket from the one containing `start` through the
    /// one containing `end`, inclusive, at every timeframe
    pub fn across_span<F>(&mut self, start: DateTime<Utc>, end: DateTime<Utc>, mut f: F) -> Result<()>
    where
        F: FnMut(&mut A) -> Result<()>,
    {
        for timeframe in Timeframe::all() {
            let last = timeframe.bucket_start(end);
            let mut t = timeframe.bucket_start(start);
            while t <= last {
                f(self.entry(timeframe, t))?;
                match timeframe.next_bucket(t) {
                    Some(next) => t = next,
                    None => break,
                }
            }
        }
        Ok(())
    }

    pub fn bucket_count(&self) -> usize {
        self.maps.values().map(HashMap::len).sum()
    }

    pub fn into_records(self) -> Vec<RollupRecord> {
        let mut records = Vec::new();
        for (timeframe, buckets) in self.maps {
            for (timestamp, accumulator) in buckets {
                records.extend(accumulator.records(timeframe, timestamp));
            }
        }
        records
    }
}

impl<A: Accumulator> RecordSource for BucketMaps<A> {
    fn bucket_count(&self) -> usize {
        BucketMaps::bucket_count(self)
    }

    fn into_records(self: Box<Self>) -> Vec<RollupRecord> {
        BucketMaps::into_records(*self)
    }
}
