//! Core domain types for chatlens
//!
//! Two row types model the two halves of the pipeline:
//!
//! | Term | Definition |
//! |------|------------|
//! | **Record** | One extracted message as persisted in the snapshot |
//! | **Message** | One loaded row: a Record plus identity and local-time projections |
//! | **Service** | Transport a message travelled over (iMessage, SMS, anything else) |
//! | **Field** | A named column of the loaded table, for column-addressed filters |
//! | **FieldValue** | A single typed column value handed to predicates |
//!
//! The split matters: everything derivable from the identity map or the
//! session timezone lives only on [`Message`], so the snapshot never has to
//! be rebuilt when the user edits the map or changes zones.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Service
// ============================================

/// Transport a message was carried over.
///
/// The store writes free-form strings; the two we care about get variants,
/// the rest are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    /// The primary service ("iMessage")
    IMessage,
    /// The carrier fallback ("SMS")
    Sms,
    /// Anything else the store reports (e.g. "RCS"), kept as-is
    Other(String),
}

impl Service {
    /// Parse the store's `service` column value. `None`/empty maps to SMS,
    /// which is what the store means when it leaves the column blank.
    pub fn from_store(raw: Option<&str>) -> Self {
        match raw {
            Some("iMessage") => Service::IMessage,
            Some("SMS") | Some("") | None => Service::Sms,
            Some(other) => Service::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Service::IMessage => "iMessage",
            Service::Sms => "SMS",
            Service::Other(s) => s,
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Service {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Service::from_store(Some(s)))
    }
}

// ============================================
// Record (snapshot row)
// ============================================

/// One message as extracted from the store and persisted in the snapshot.
///
/// Rows are ordered by (`sent_at`, `rowid`) ascending; `rowid` is the
/// store's own message row id and breaks timestamp ties by insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Store message row id (unique, monotonic with insertion)
    pub rowid: i64,
    /// Store chat row id, rendered as a decimal string
    pub chat_id: String,
    /// Decoded body; empty when the message carried no text or the body
    /// could not be decoded
    pub text: String,
    /// Send time, normalized from the store's epoch to UTC
    pub sent_at: DateTime<Utc>,
    /// Whether this message was sent by the store's owner
    pub is_from_me: bool,
    /// Transport service
    pub service: Service,
}

// ============================================
// Message (loaded row)
// ============================================

/// One loaded row: a [`Record`] joined with the identity map and projected
/// into the session timezone.
///
/// `weekday`, `hour` and `length` are precomputed here because every
/// aggregation wants them and they are pure functions of the other columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// Store message row id
    pub rowid: i64,
    /// Store chat row id, as a string
    pub chat_id: String,
    /// Decoded body
    pub text: String,
    /// Send time in UTC
    pub sent_at: DateTime<Utc>,
    /// Send time in the session timezone (naive; the zone lives on the table)
    pub date_local: NaiveDateTime,
    /// Whether the store's owner sent this message
    pub is_from_me: bool,
    /// Transport service
    pub service: Service,
    /// Identity-map display name, or [`crate::idmap::UNMAPPED`]
    pub contact: String,
    /// Day of week of `date_local`, 0 = Monday .. 6 = Sunday
    pub weekday: u8,
    /// Hour of day of `date_local`, 0-23
    pub hour: u8,
    /// Character count of `text`
    pub length: u32,
}

impl Message {
    /// Human-readable local send time, e.g. "2019.04.20 03:15:42 PM".
    pub fn timestamp_display(&self) -> String {
        self.date_local.format("%Y.%m.%d %r").to_string()
    }

    /// The value of a named column, for column-addressed filters.
    pub fn value(&self, field: Field) -> FieldValue {
        match field {
            Field::ChatId => FieldValue::Str(self.chat_id.clone()),
            Field::Contact => FieldValue::Str(self.contact.clone()),
            Field::Text => FieldValue::Str(self.text.clone()),
            Field::Service => FieldValue::Str(self.service.as_str().to_string()),
            Field::IsFromMe => FieldValue::Bool(self.is_from_me),
            Field::Weekday => FieldValue::Int(i64::from(self.weekday)),
            Field::Hour => FieldValue::Int(i64::from(self.hour)),
            Field::Length => FieldValue::Int(i64::from(self.length)),
        }
    }
}

// ============================================
// Column addressing
// ============================================

/// Named columns of the loaded table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ChatId,
    Contact,
    Text,
    Service,
    IsFromMe,
    Weekday,
    Hour,
    Length,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::ChatId => "chat_id",
            Field::Contact => "contact",
            Field::Text => "text",
            Field::Service => "service",
            Field::IsFromMe => "is_from_me",
            Field::Weekday => "weekday",
            Field::Hour => "hour",
            Field::Length => "length",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "chat_id" => Ok(Field::ChatId),
            "contact" => Ok(Field::Contact),
            "text" => Ok(Field::Text),
            "service" => Ok(Field::Service),
            "is_from_me" => Ok(Field::IsFromMe),
            "weekday" => Ok(Field::Weekday),
            "hour" => Ok(Field::Hour),
            "length" => Ok(Field::Length),
            _ => Err(format!("unknown field: {}", s)),
        }
    }
}

/// A single typed column value.
///
/// Predicates passed to `filt_func` receive these, so the extension point
/// stays a plain typed function value rather than anything dynamic.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl FieldValue {
    /// Render for use as a grouping key.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Str(s) => s.clone(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Bool(b) => b.to_string(),
        }
    }

    /// Borrow the string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if this is an integer value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_message() -> Message {
        let sent_at = Utc.with_ymd_and_hms(2019, 4, 20, 7, 0, 0).unwrap();
        Message {
            rowid: 42,
            chat_id: "7".to_string(),
            text: "hello".to_string(),
            sent_at,
            date_local: sent_at.naive_utc(),
            is_from_me: true,
            service: Service::IMessage,
            contact: "Koala".to_string(),
            weekday: 5,
            hour: 7,
            length: 5,
        }
    }

    #[test]
    fn test_service_from_store() {
        assert_eq!(Service::from_store(Some("iMessage")), Service::IMessage);
        assert_eq!(Service::from_store(Some("SMS")), Service::Sms);
        assert_eq!(Service::from_store(None), Service::Sms);
        assert_eq!(Service::from_store(Some("")), Service::Sms);
        assert_eq!(
            Service::from_store(Some("RCS")),
            Service::Other("RCS".to_string())
        );
    }

    #[test]
    fn test_service_round_trip_str() {
        for raw in ["iMessage", "SMS", "RCS"] {
            let service: Service = raw.parse().unwrap();
            assert_eq!(service.as_str(), raw);
        }
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("contact".parse::<Field>().unwrap(), Field::Contact);
        assert_eq!("weekday".parse::<Field>().unwrap(), Field::Weekday);
        assert!("no_such_column".parse::<Field>().is_err());
    }

    #[test]
    fn test_message_value() {
        let msg = sample_message();
        assert_eq!(msg.value(Field::Contact), FieldValue::Str("Koala".into()));
        assert_eq!(msg.value(Field::IsFromMe), FieldValue::Bool(true));
        assert_eq!(msg.value(Field::Hour), FieldValue::Int(7));
        assert_eq!(msg.value(Field::Length), FieldValue::Int(5));
    }

    #[test]
    fn test_timestamp_display() {
        let msg = sample_message();
        assert_eq!(msg.timestamp_display(), "2019.04.20 07:00:00 AM");
    }

    #[test]
    fn test_field_value_render() {
        assert_eq!(FieldValue::Str("Mom".into()).render(), "Mom");
        assert_eq!(FieldValue::Int(3).render(), "3");
        assert_eq!(FieldValue::Bool(false).render(), "false");
    }
}
