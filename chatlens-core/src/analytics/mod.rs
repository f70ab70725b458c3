//! Aggregations over the loaded table
//!
//! Provides the numeric summaries behind the plots:
//! - Time series (count or text length per bucket, optionally grouped)
//! - Breakdown (per-group totals with sliver folding for pie-style views)
//! - Weekly heatmap (day-of-week × hour-of-day activity grid)
//!
//! Everything here consumes a [`MessageTable`](crate::table::MessageTable)
//! and produces plain data; rendering belongs to the caller.

pub mod breakdown;
pub mod heatmap;
pub mod series;

pub use breakdown::{Breakdown, BreakdownEntry};
pub use heatmap::{WeeklyHeatmap, DAY_LABELS};
pub use series::{TimeBucket, TimeSeries};

/// What a cell aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Number of messages
    Count,
    /// Sum of message character counts
    TotalLength,
    /// Average message character count
    MeanLength,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Count => "count",
            Metric::TotalLength => "total_length",
            Metric::MeanLength => "mean_length",
        }
    }

    /// Collapse an accumulated cell into its final value.
    pub(crate) fn finalize(&self, sum: f64, rows: u64) -> f64 {
        match self {
            Metric::Count => rows as f64,
            Metric::TotalLength => sum,
            Metric::MeanLength => {
                if rows > 0 {
                    sum / rows as f64
                } else {
                    0.0
                }
            }
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "count" => Ok(Metric::Count),
            "length" | "total_length" => Ok(Metric::TotalLength),
            "mean" | "mean_length" => Ok(Metric::MeanLength),
            _ => Err(format!("unknown metric: {}", s)),
        }
    }
}
