//! Read-only contract with the external message store
//!
//! The store is a SQLite file owned by another application; its schema is
//! fixed from our side. Every table name, column name and join key lives in
//! this module, so a store schema change touches exactly one place. The
//! store is only ever opened read-only and works fine on a copied file.

use crate::error::{Error, Result};
use rusqlite::{Connection, OpenFlags};
use std::collections::BTreeMap;
use std::path::Path;

/// Tables and columns the extraction touches, checked up front so schema
/// drift fails with one clear error instead of a mid-pass query failure.
/// ROWID columns are implicit and not listed.
const REQUIRED_TABLES: &[(&str, &[&str])] = &[
    ("message", &["text", "attributedBody", "date", "is_from_me", "service"]),
    ("chat", &["chat_identifier", "display_name"]),
    ("chat_message_join", &["chat_id", "message_id"]),
    ("chat_handle_join", &["chat_id", "handle_id"]),
    ("handle", &["id"]),
];

/// One message row as the store holds it, chat membership attached.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Store message row id
    pub rowid: i64,
    /// Store chat row id from the membership join
    pub chat_rowid: i64,
    /// Plain text column (NULL on newer rows)
    pub text: Option<String>,
    /// Archived body blob (NULL on older rows)
    pub body: Option<Vec<u8>>,
    /// Send time in store-native nanoseconds
    pub date_ns: i64,
    /// Sender flag
    pub is_from_me: bool,
    /// Raw service column value
    pub service: Option<String>,
}

/// Chat-level metadata used for preview titles.
#[derive(Debug, Clone)]
pub struct ChatInfo {
    /// Store chat row id
    pub rowid: i64,
    /// Store chat identifier (a phone number, email or group id)
    pub identifier: Option<String>,
    /// User-visible group name, when one was set
    pub display_name: Option<String>,
}

impl ChatInfo {
    /// Best available human-readable title for this chat.
    pub fn title(&self) -> String {
        match (&self.display_name, &self.identifier) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, Some(id)) if !id.is_empty() => id.clone(),
            _ => format!("chat {}", self.rowid),
        }
    }
}

/// Read-only handle on the raw message store.
#[derive(Debug)]
pub struct MessageStore {
    conn: Connection,
}

impl MessageStore {
    /// Open the store file read-only and validate its schema.
    ///
    /// A missing or non-SQLite file is a [`Error::SourceNotFound`]; a SQLite
    /// file without the expected tables is a [`Error::Schema`].
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::SourceNotFound(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        verify_schema(&conn).map_err(|e| match e {
            Error::Database(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::NotADatabase =>
            {
                Error::SourceNotFound(path.to_path_buf())
            }
            other => other,
        })?;

        Ok(Self { conn })
    }

    /// Fetch every message with chat membership, in store date order.
    ///
    /// Messages without a row in the membership join belong to no chat and
    /// are not part of the conversation history, so the join is inner.
    pub fn fetch_messages(&self) -> Result<Vec<RawMessage>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT m.ROWID, cmj.chat_id, m.text, m.attributedBody,
                   m.date, m.is_from_me, m.service
            FROM message m
            INNER JOIN chat_message_join cmj ON m.ROWID = cmj.message_id
            ORDER BY m.date, m.ROWID
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(RawMessage {
                rowid: row.get(0)?,
                chat_rowid: row.get(1)?,
                text: row.get(2)?,
                body: row.get(3)?,
                date_ns: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                is_from_me: row.get::<_, Option<i64>>(5)?.unwrap_or(0) != 0,
                service: row.get(6)?,
            })
        })?;

        let messages = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        tracing::debug!(count = messages.len(), "Fetched messages from store");
        Ok(messages)
    }

    /// Fetch chat metadata for every chat, keyed by store row id.
    pub fn fetch_chats(&self) -> Result<BTreeMap<i64, ChatInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.ROWID, c.chat_identifier, c.display_name FROM chat c ORDER BY c.ROWID",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ChatInfo {
                rowid: row.get(0)?,
                identifier: row.get(1)?,
                display_name: row.get(2)?,
            })
        })?;

        let mut chats = BTreeMap::new();
        for chat in rows {
            let chat = chat?;
            chats.insert(chat.rowid, chat);
        }
        Ok(chats)
    }

    /// Fetch participant handle strings per chat, for preview headers.
    pub fn fetch_participants(&self) -> Result<BTreeMap<i64, Vec<String>>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT chj.chat_id, h.id
            FROM chat_handle_join chj
            INNER JOIN handle h ON chj.handle_id = h.ROWID
            ORDER BY chj.chat_id, h.ROWID
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut participants: BTreeMap<i64, Vec<String>> = BTreeMap::new();
        for row in rows {
            let (chat_id, handle) = row?;
            participants.entry(chat_id).or_default().push(handle);
        }
        Ok(participants)
    }
}

/// Check the required tables and columns exist.
fn verify_schema(conn: &Connection) -> Result<()> {
    for (table, columns) in REQUIRED_TABLES {
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |r| r.get(0),
        )?;
        if exists == 0 {
            return Err(Error::Schema(format!("missing table: {}", table)));
        }

        let present: Vec<String> = conn
            .prepare("SELECT name FROM pragma_table_info(?1)")?
            .query_map([table], |r| r.get(0))?
            .collect::<rusqlite::Result<_>>()?;

        for column in *columns {
            if !present.iter().any(|c| c == column) {
                return Err(Error::Schema(format!(
                    "table {} is missing column {}",
                    table, column
                )));
            }
        }
    }
    Ok(())
}
