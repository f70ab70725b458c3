//! Loader: snapshot + identity map + timezone → queryable table
//!
//! Loading is a pure projection. The snapshot rows never change; the
//! identity map and the session timezone are applied on top of them, fresh
//! on every call, so editing the map or switching zones needs no rebuild.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::idmap::IdentityMap;
use crate::snapshot;
use crate::table::MessageTable;
use crate::types::{Message, Record};
use chrono::{DateTime, Datelike, Local, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;
use std::path::Path;

/// Timezone the loaded table is projected into.
#[derive(Debug, Clone, Copy)]
pub enum Zone {
    /// Whatever the host considers local time
    System,
    /// A named IANA zone, e.g. "US/Pacific"
    Named(Tz),
}

impl Zone {
    /// Resolve an optional zone name; `None` means the system zone.
    pub fn from_name(name: Option<&str>) -> Result<Self> {
        match name {
            None => Ok(Zone::System),
            Some(s) => {
                let tz: Tz = s.parse().map_err(|_| Error::Timezone(s.to_string()))?;
                Ok(Zone::Named(tz))
            }
        }
    }

    /// Project a UTC instant into this zone's wall-clock time.
    pub fn localize(&self, at: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Zone::System => at.with_timezone(&Local).naive_local(),
            Zone::Named(tz) => at.with_timezone(tz).naive_local(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Zone::System => "system-local",
            Zone::Named(tz) => tz.name(),
        }
    }
}

/// Load the flat table, resolving contacts and localizing timestamps.
///
/// `map_path` is optional; without it (or with the file absent) every
/// contact resolves to the sentinel. `timezone` is an IANA zone name,
/// defaulting to the system zone. Repeated calls with the same inputs
/// yield identical tables.
pub fn load(
    table_path: &Path,
    map_path: Option<&Path>,
    timezone: Option<&str>,
) -> Result<MessageTable> {
    let zone = Zone::from_name(timezone)?;
    let map = match map_path {
        Some(path) => IdentityMap::load(path)?,
        None => IdentityMap::default(),
    };

    let records = snapshot::read(table_path)?;
    let messages: Vec<Message> = records
        .into_iter()
        .map(|record| localize_record(record, &map, &zone))
        .collect();

    tracing::info!(
        rows = messages.len(),
        contacts = map.len(),
        zone = zone.name(),
        "Loaded message table"
    );
    Ok(MessageTable::new(messages))
}

/// [`load`] with paths and zone taken from the configuration.
pub fn load_with_config(config: &Config) -> Result<MessageTable> {
    let map_path = config.map_path();
    load(
        &Config::snapshot_path(),
        Some(&map_path),
        config.load.timezone.as_deref(),
    )
}

fn localize_record(record: Record, map: &IdentityMap, zone: &Zone) -> Message {
    let date_local = zone.localize(record.sent_at);
    let contact = map.resolve(&record.chat_id).to_string();
    let length = record.text.chars().count() as u32;

    Message {
        rowid: record.rowid,
        chat_id: record.chat_id,
        text: record.text,
        sent_at: record.sent_at,
        date_local,
        is_from_me: record.is_from_me,
        service: record.service,
        contact,
        weekday: date_local.weekday().num_days_from_monday() as u8,
        hour: date_local.hour() as u8,
        length,
    }
}
