//! Per-group totals with sliver folding
//!
//! A breakdown is the data behind a pie chart: one value per distinct value
//! of a grouping column, plus each group's share of the total. Folding
//! collapses groups below a share threshold into a single "other" slice and
//! hands back the remainder re-normalized, so a second chart can zoom into
//! the long tail.

use super::Metric;
use crate::table::MessageTable;
use crate::types::Field;
use std::collections::BTreeMap;

/// Label for the folded long-tail slice. Same word the identity map uses
/// for unmapped chats, so the two merge into one slice when both appear.
const FOLDED_KEY: &str = "other";

/// One slice of a breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownEntry {
    /// Grouping column value
    pub key: String,
    /// Aggregated metric value
    pub value: f64,
    /// Percent of the breakdown's total, 0-100
    pub share: f64,
}

/// Per-group aggregation over a table, sorted by value descending.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown {
    pub field: Field,
    pub total: f64,
    pub entries: Vec<BreakdownEntry>,
}

impl Breakdown {
    /// Aggregate `metric` per distinct value of `field`.
    pub fn compute(table: &MessageTable, field: Field, metric: Metric) -> Breakdown {
        let mut cells: BTreeMap<String, (f64, u64)> = BTreeMap::new();
        for m in table.iter() {
            let cell = cells.entry(m.value(field).render()).or_insert((0.0, 0));
            cell.0 += f64::from(m.length);
            cell.1 += 1;
        }

        let totals: BTreeMap<String, f64> = cells
            .into_iter()
            .map(|(key, (sum, rows))| (key, metric.finalize(sum, rows)))
            .collect();
        let total = totals.values().sum();
        Self::from_totals(field, totals, total)
    }

    /// Fold entries with a share below `min_share` percent into one
    /// [`FOLDED_KEY`] slice.
    ///
    /// Returns the folded view and, when anything was folded, the folded
    /// entries as their own breakdown with shares re-normalized against the
    /// remainder total.
    pub fn fold_slivers(&self, min_share: f64) -> (Breakdown, Option<Breakdown>) {
        let mut folded: BTreeMap<String, f64> = BTreeMap::new();
        let mut rest: BTreeMap<String, f64> = BTreeMap::new();

        for entry in &self.entries {
            if entry.share >= min_share {
                *folded.entry(entry.key.clone()).or_insert(0.0) += entry.value;
            } else {
                *folded.entry(FOLDED_KEY.to_string()).or_insert(0.0) += entry.value;
                rest.insert(entry.key.clone(), entry.value);
            }
        }

        let view = Self::from_totals(self.field, folded, self.total);
        let remainder = if rest.is_empty() {
            None
        } else {
            let total = rest.values().sum();
            Some(Self::from_totals(self.field, rest, total))
        };
        (view, remainder)
    }

    /// Successive folded views, one per threshold: the first over the full
    /// data, each later one zooming into the previous round's folded tail.
    pub fn rounds(&self, slivers: &[f64]) -> Vec<Breakdown> {
        let mut out = Vec::new();
        let mut current = self.clone();
        for &threshold in slivers {
            let (view, remainder) = current.fold_slivers(threshold);
            out.push(view);
            match remainder {
                Some(rest) => current = rest,
                None => break,
            }
        }
        out
    }

    fn from_totals(field: Field, totals: BTreeMap<String, f64>, total: f64) -> Breakdown {
        let mut entries: Vec<BreakdownEntry> = totals
            .into_iter()
            .map(|(key, value)| BreakdownEntry {
                key,
                value,
                share: if total > 0.0 { value / total * 100.0 } else { 0.0 },
            })
            .collect();
        entries.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.key.cmp(&b.key)));
        Breakdown {
            field,
            total,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, Service};
    use chrono::{Datelike, TimeZone, Timelike, Utc};

    fn msg_from(rowid: i64, contact: &str, text: &str) -> Message {
        let sent_at = Utc.with_ymd_and_hms(2023, 6, 5, 12, 0, 0).unwrap();
        let date_local = sent_at.naive_utc();
        Message {
            rowid,
            chat_id: "7".to_string(),
            text: text.to_string(),
            sent_at,
            date_local,
            is_from_me: false,
            service: Service::IMessage,
            contact: contact.to_string(),
            weekday: date_local.weekday().num_days_from_monday() as u8,
            hour: date_local.hour() as u8,
            length: text.chars().count() as u32,
        }
    }

    fn table_with_counts(counts: &[(&str, usize)]) -> MessageTable {
        let mut rows = Vec::new();
        let mut rowid = 0;
        for (contact, n) in counts {
            for _ in 0..*n {
                rowid += 1;
                rows.push(msg_from(rowid, contact, "hi"));
            }
        }
        MessageTable::new(rows)
    }

    #[test]
    fn test_compute_counts_and_shares() {
        let table = table_with_counts(&[("Koala", 6), ("Mom", 3), ("Dad", 1)]);
        let breakdown = Breakdown::compute(&table, Field::Contact, Metric::Count);

        assert_eq!(breakdown.total, 10.0);
        let keys: Vec<&str> = breakdown.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["Koala", "Mom", "Dad"]);
        assert_eq!(breakdown.entries[0].value, 6.0);
        assert!((breakdown.entries[0].share - 60.0).abs() < 1e-9);
        assert!((breakdown.entries[2].share - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_fold_slivers() {
        let table = table_with_counts(&[("Koala", 60), ("Mom", 25), ("Dad", 9), ("Gym", 6)]);
        let breakdown = Breakdown::compute(&table, Field::Contact, Metric::Count);

        let (view, remainder) = breakdown.fold_slivers(10.0);
        let keys: Vec<&str> = view.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["Koala", "Mom", "other"]);
        assert_eq!(view.entries[2].value, 15.0);
        // Folded view keeps the original total so shares stay comparable.
        assert_eq!(view.total, 100.0);

        let rest = remainder.unwrap();
        assert_eq!(rest.total, 15.0);
        assert_eq!(rest.entries[0].key, "Dad");
        assert!((rest.entries[0].share - 60.0).abs() < 1e-9);
        assert!((rest.entries[1].share - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_fold_merges_with_unmapped_contact() {
        let table = table_with_counts(&[("Koala", 80), ("other", 15), ("Gym", 5)]);
        let breakdown = Breakdown::compute(&table, Field::Contact, Metric::Count);

        let (view, _) = breakdown.fold_slivers(10.0);
        let other = view.entries.iter().find(|e| e.key == "other").unwrap();
        assert_eq!(other.value, 20.0);
    }

    #[test]
    fn test_fold_nothing_below_threshold() {
        let table = table_with_counts(&[("Koala", 50), ("Mom", 50)]);
        let breakdown = Breakdown::compute(&table, Field::Contact, Metric::Count);

        let (view, remainder) = breakdown.fold_slivers(10.0);
        assert_eq!(view.entries.len(), 2);
        assert!(view.entries.iter().all(|e| e.key != "other"));
        assert!(remainder.is_none());
    }

    #[test]
    fn test_rounds_zoom_into_tail() {
        let table = table_with_counts(&[("Koala", 70), ("Mom", 20), ("Dad", 6), ("Gym", 4)]);
        let breakdown = Breakdown::compute(&table, Field::Contact, Metric::Count);

        let rounds = breakdown.rounds(&[10.0, 50.0]);
        assert_eq!(rounds.len(), 2);
        // Second round re-normalizes Dad (60%) and Gym (40%) and folds Gym.
        let second: Vec<&str> = rounds[1].entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(second, vec!["Dad", "other"]);
    }

    #[test]
    fn test_mean_length_metric() {
        let table = MessageTable::new(vec![
            msg_from(1, "Koala", "abcd"),
            msg_from(2, "Koala", "abcdef"),
            msg_from(3, "Mom", "xy"),
        ]);
        let breakdown = Breakdown::compute(&table, Field::Contact, Metric::MeanLength);

        let koala = breakdown.entries.iter().find(|e| e.key == "Koala").unwrap();
        assert_eq!(koala.value, 5.0);
        let mom = breakdown.entries.iter().find(|e| e.key == "Mom").unwrap();
        assert_eq!(mom.value, 2.0);
    }

    #[test]
    fn test_empty_table() {
        let breakdown = Breakdown::compute(
            &MessageTable::new(Vec::new()),
            Field::Contact,
            Metric::Count,
        );
        assert_eq!(breakdown.total, 0.0);
        assert!(breakdown.entries.is_empty());
    }
}
