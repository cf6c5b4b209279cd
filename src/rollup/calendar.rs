//! Calendar bucketing for rollup timeframes
//!
//! Every timestamp maps to the start instant (UTC) of the day, ISO week,
//! month and year containing it. Weeks start on Monday 00:00.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timeframe {
    Day,
    Week,
    Month,
    Year,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Year => "year",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "day" => Some(Timeframe::Day),
            "week" => Some(Timeframe::Week),
            "month" => Some(Timeframe::Month),
            "year" => Some(Timeframe::Year),
            _ => None,
        }
    }

    pub fn all() -> [Timeframe; 4] {
        [
            Timeframe::Day,
            Timeframe::Week,
            Timeframe::Month,
            Timeframe::Year,
        ]
    }

    /// Start instant of the bucket containing `t`
    pub fn bucket_start(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Timeframe::Day => day_start(t),
            Timeframe::Week => week_start(t),
            Timeframe::Month => month_start(t),
            Timeframe::Year => year_start(t),
        }
    }

    /// Start instant of the bucket following the one starting at `start`
    ///
    /// `start` must already be a bucket start for this timeframe. Returns
    /// `None` only past the end of chrono's representable range.
    pub fn next_bucket(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Timeframe::Day => start.checked_add_days(Days::new(1)),
            Timeframe::Week => start.checked_add_days(Days::new(7)),
            Timeframe::Month => start.checked_add_months(Months::new(1)),
            Timeframe::Year => start.checked_add_months(Months::new(12)),
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

pub fn day_start(t: DateTime<Utc>) -> DateTime<Utc> {
    midnight(t.date_naive())
}

pub fn week_start(t: DateTime<Utc>) -> DateTime<Utc> {
    let date = t.date_naive();
    let offset = u64::from(date.weekday().num_days_from_monday());
    // only fails at chrono's minimum date
    midnight(date.checked_sub_days(Days::new(offset)).unwrap_or(date))
}

pub fn month_start(t: DateTime<Utc>) -> DateTime<Utc> {
    let date = t.date_naive();
    midnight(date.with_day(1).unwrap_or(date))
}

pub fn year_start(t: DateTime<Utc>) -> DateTime<Utc> {
    let date = t.date_naive();
    midnight(NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date))
}
