//! Count and length over time
//!
//! Rows bucket by their local send time into a continuous axis from the
//! first active bucket to the last. Every group carries a value for every
//! bucket; quiet stretches are explicit zeros so trend plots show valleys,
//! not gaps.

use super::Metric;
use crate::table::MessageTable;
use crate::types::Field;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

/// Fixed bucket widths for the time axis.
///
/// Weeks start on Monday, matching the weekday numbering used everywhere
/// else in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    Day,
    Week,
    Month,
    Year,
}

impl TimeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeBucket::Day => "day",
            TimeBucket::Week => "week",
            TimeBucket::Month => "month",
            TimeBucket::Year => "year",
        }
    }

    /// The start of the bucket containing `at`.
    pub fn floor(&self, at: NaiveDateTime) -> NaiveDate {
        let date = at.date();
        match self {
            TimeBucket::Day => date,
            TimeBucket::Week => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            TimeBucket::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap(),
            TimeBucket::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap(),
        }
    }

    /// The start of the bucket following the one starting at `start`.
    pub fn next(&self, start: NaiveDate) -> NaiveDate {
        match self {
            TimeBucket::Day => start + Duration::days(1),
            TimeBucket::Week => start + Duration::days(7),
            TimeBucket::Month => {
                if start.month() == 12 {
                    NaiveDate::from_ymd_opt(start.year() + 1, 1, 1).unwrap()
                } else {
                    NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1).unwrap()
                }
            }
            TimeBucket::Year => NaiveDate::from_ymd_opt(start.year() + 1, 1, 1).unwrap(),
        }
    }

    /// Axis label for the bucket starting at `start`.
    pub fn label(&self, start: NaiveDate) -> String {
        match self {
            TimeBucket::Day | TimeBucket::Week => start.format("%Y-%m-%d").to_string(),
            TimeBucket::Month => start.format("%Y-%m").to_string(),
            TimeBucket::Year => start.format("%Y").to_string(),
        }
    }
}

impl std::fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TimeBucket {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "day" | "d" => Ok(TimeBucket::Day),
            "week" | "w" => Ok(TimeBucket::Week),
            "month" | "m" => Ok(TimeBucket::Month),
            "year" | "y" => Ok(TimeBucket::Year),
            _ => Err(format!("unknown bucket: {}", s)),
        }
    }
}

#[derive(Debug, Default)]
struct Cell {
    sum: f64,
    rows: u64,
}

/// A bucketed, grouped series with a dense axis.
///
/// `groups` maps group key → one value per entry of `starts`, zero where
/// the group was quiet.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub bucket: TimeBucket,
    pub starts: Vec<NaiveDate>,
    pub groups: BTreeMap<String, Vec<f64>>,
}

impl TimeSeries {
    /// Bucket `table` by `bucket`, optionally grouped by a column.
    ///
    /// Without `group_by` the whole table becomes a single group keyed
    /// `"all"`.
    pub fn compute(
        table: &MessageTable,
        bucket: TimeBucket,
        group_by: Option<Field>,
        metric: Metric,
    ) -> TimeSeries {
        let mut cells: BTreeMap<String, BTreeMap<NaiveDate, Cell>> = BTreeMap::new();
        let mut span: Option<(NaiveDate, NaiveDate)> = None;

        for m in table.iter() {
            let start = bucket.floor(m.date_local);
            span = Some(match span {
                None => (start, start),
                Some((lo, hi)) => (lo.min(start), hi.max(start)),
            });

            let key = group_by
                .map(|f| m.value(f).render())
                .unwrap_or_else(|| "all".to_string());
            let cell = cells.entry(key).or_default().entry(start).or_default();
            cell.sum += f64::from(m.length);
            cell.rows += 1;
        }

        let mut starts = Vec::new();
        if let Some((lo, hi)) = span {
            let mut cur = lo;
            while cur <= hi {
                starts.push(cur);
                cur = bucket.next(cur);
            }
        }

        let mut groups = BTreeMap::new();
        for (key, by_start) in cells {
            let values = starts
                .iter()
                .map(|s| match by_start.get(s) {
                    Some(cell) => metric.finalize(cell.sum, cell.rows),
                    None => 0.0,
                })
                .collect();
            groups.insert(key, values);
        }

        TimeSeries {
            bucket,
            starts,
            groups,
        }
    }

    /// Axis labels, one per bucket.
    pub fn labels(&self) -> Vec<String> {
        self.starts.iter().map(|s| self.bucket.label(*s)).collect()
    }

    /// Sum of a group's values across the whole axis.
    pub fn group_total(&self, key: &str) -> f64 {
        self.groups
            .get(key)
            .map(|values| values.iter().sum())
            .unwrap_or(0.0)
    }
}
