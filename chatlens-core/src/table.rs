//! Filter and query helpers over the loaded table
//!
//! Every operation here takes `&self` and returns a new table, never
//! mutating in place, so filters compose by plain chaining:
//!
//! ```rust,ignore
//! let koala_2019 = table
//!     .filt_date(Some("2019-01-01"), Some("2020-01-01"))?
//!     .filt_any(Field::Contact, &["Koala".into()]);
//! ```
//!
//! Date bounds are wall-clock strings interpreted in the table's timezone,
//! i.e. they compare against `date_local`, with the start inclusive and the
//! end exclusive.

use crate::error::{Error, Result};
use crate::types::{Field, FieldValue, Message};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y.%m.%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// The loaded, queryable flat table: one row per message, ascending by
/// (`sent_at`, `rowid`).
#[derive(Debug, Clone, PartialEq)]
pub struct MessageTable {
    messages: Vec<Message>,
}

/// One text-search hit with its surrounding same-chat rows.
///
/// Windows from nearby matches may repeat rows; they are reported per match
/// and never merged.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextWindow {
    /// Chat the match belongs to
    pub chat_id: String,
    /// The matched row and its neighbors, in chronological order
    pub messages: Vec<Message>,
    /// Index of the matched row within `messages`
    pub match_index: usize,
}

impl ContextWindow {
    /// The matched row itself.
    pub fn matched(&self) -> &Message {
        &self.messages[self.match_index]
    }
}

impl MessageTable {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    // ============================================
    // Filters
    // ============================================

    /// Keep rows whose local send time falls within `[start, end)`.
    ///
    /// Either bound may be omitted to leave that side open. Bounds accept a
    /// handful of date and datetime layouts ("2019-04-20", "Jan 1, 2019",
    /// "2019-04-20 13:30", ...); anything else is [`Error::Parse`].
    pub fn filt_date(&self, start: Option<&str>, end: Option<&str>) -> Result<MessageTable> {
        let start = start.map(parse_bound).transpose()?;
        let end = end.map(parse_bound).transpose()?;

        let rows = self
            .messages
            .iter()
            .filter(|m| {
                start.map_or(true, |s| m.date_local >= s)
                    && end.map_or(true, |e| m.date_local < e)
            })
            .cloned()
            .collect();
        Ok(MessageTable::new(rows))
    }

    /// Keep rows where `field`'s value is one of `values`.
    ///
    /// A one-element slice is a plain equality filter.
    pub fn filt_any(&self, field: Field, values: &[FieldValue]) -> MessageTable {
        let rows = self
            .messages
            .iter()
            .filter(|m| values.contains(&m.value(field)))
            .cloned()
            .collect();
        MessageTable::new(rows)
    }

    /// Keep rows where `predicate` holds for `field`'s value.
    ///
    /// The predicate runs once per row.
    pub fn filt_func<F>(&self, field: Field, predicate: F) -> MessageTable
    where
        F: Fn(&FieldValue) -> bool,
    {
        let rows = self
            .messages
            .iter()
            .filter(|m| predicate(&m.value(field)))
            .cloned()
            .collect();
        MessageTable::new(rows)
    }

    // ============================================
    // Text search
    // ============================================

    /// Keep rows whose text contains `needle`.
    pub fn search(&self, needle: &str, case_insensitive: bool) -> MessageTable {
        let matcher = Matcher::new(needle, case_insensitive);
        let rows = self
            .messages
            .iter()
            .filter(|m| matcher.matches(&m.text))
            .cloned()
            .collect();
        MessageTable::new(rows)
    }

    /// Find rows whose text contains `needle` and return each match inside
    /// a window of up to `radius` same-chat rows on either side.
    ///
    /// Windows are clamped at chat boundaries and reported in chronological
    /// order of the match.
    pub fn context_search(
        &self,
        needle: &str,
        radius: usize,
        case_insensitive: bool,
    ) -> Vec<ContextWindow> {
        let matcher = Matcher::new(needle, case_insensitive);

        // Table indices per chat, each list ascending like the table.
        let mut by_chat: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, m) in self.messages.iter().enumerate() {
            by_chat.entry(m.chat_id.as_str()).or_default().push(i);
        }

        let mut windows = Vec::new();
        for (chat_id, idxs) in &by_chat {
            for (pos, &i) in idxs.iter().enumerate() {
                if !matcher.matches(&self.messages[i].text) {
                    continue;
                }
                let lo = pos.saturating_sub(radius);
                let hi = (pos + radius).min(idxs.len() - 1);
                let rows: Vec<Message> = idxs[lo..=hi]
                    .iter()
                    .map(|&j| self.messages[j].clone())
                    .collect();
                windows.push(ContextWindow {
                    chat_id: chat_id.to_string(),
                    messages: rows,
                    match_index: pos - lo,
                });
            }
        }

        windows.sort_by_key(|w| (w.matched().sent_at, w.matched().rowid));
        windows
    }
}

/// Substring matcher with optional case folding, needle folded once.
struct Matcher {
    needle: String,
    case_insensitive: bool,
}

impl Matcher {
    fn new(needle: &str, case_insensitive: bool) -> Self {
        Self {
            needle: if case_insensitive {
                needle.to_lowercase()
            } else {
                needle.to_string()
            },
            case_insensitive,
        }
    }

    fn matches(&self, text: &str) -> bool {
        if self.case_insensitive {
            text.to_lowercase().contains(&self.needle)
        } else {
            text.contains(&self.needle)
        }
    }
}

fn parse_bound(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(d.and_hms_opt(0, 0, 0).unwrap());
        }
    }
    Err(Error::Parse(raw.to_string()))
}
