//! Day-of-week × hour-of-day activity grid
//!
//! Built from `date_local`, never UTC; daily rhythm only means anything in
//! wall-clock time. Rows are Monday-first, columns are hours 0-23, and
//! every cell is present even when zero.

use crate::table::MessageTable;

/// Single-letter day labels, Monday first (R = Thursday, A = Saturday,
/// U = Sunday).
pub const DAY_LABELS: [&str; 7] = ["M", "T", "W", "R", "F", "A", "U"];

/// Message counts per (weekday, hour) cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyHeatmap {
    grid: [[u64; 24]; 7],
}

impl WeeklyHeatmap {
    /// Count every row of `table` into its local-time cell.
    pub fn compute(table: &MessageTable) -> WeeklyHeatmap {
        let mut grid = [[0u64; 24]; 7];
        for m in table.iter() {
            grid[usize::from(m.weekday)][usize::from(m.hour)] += 1;
        }
        WeeklyHeatmap { grid }
    }

    /// The full 7×24 grid, Monday-first rows.
    pub fn grid(&self) -> &[[u64; 24]; 7] {
        &self.grid
    }

    /// Count in one cell; `weekday` 0 = Monday, `hour` 0-23.
    pub fn count(&self, weekday: usize, hour: usize) -> u64 {
        self.grid[weekday][hour]
    }

    pub fn total(&self) -> u64 {
        self.grid.iter().flatten().sum()
    }

    /// Largest cell value, for color scaling.
    pub fn max(&self) -> u64 {
        self.grid.iter().flatten().copied().max().unwrap_or(0)
    }

    /// The busiest cell as `(weekday, hour, count)`, or `None` when the
    /// table was empty. Earlier cells win ties.
    pub fn peak(&self) -> Option<(usize, usize, u64)> {
        let mut best: Option<(usize, usize, u64)> = None;
        for (weekday, row) in self.grid.iter().enumerate() {
            for (hour, &count) in row.iter().enumerate() {
                if count > 0 && best.map_or(true, |(_, _, b)| count > b) {
                    best = Some((weekday, hour, count));
                }
            }
        }
        best
    }

    /// The busiest weekday as `(weekday, count)`, or `None` when empty.
    pub fn busiest_day(&self) -> Option<(usize, u64)> {
        let mut best: Option<(usize, u64)> = None;
        for (weekday, row) in self.grid.iter().enumerate() {
            let total: u64 = row.iter().sum();
            if total > 0 && best.map_or(true, |(_, b)| total > b) {
                best = Some((weekday, total));
            }
        }
        best
    }
}
