//! Extraction layer: raw message store → flat snapshot
//!
//! This module orchestrates the one-way pass from the external SQLite store
//! to the files everything else reads.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌──────────────────┐
//! │   chat.db    │ ──► │   Extractor   │ ──► │  messages.bin    │
//! │ (read-only)  │     │               │     │  previews/*.html │
//! └──────────────┘     └───────────────┘     └──────────────────┘
//!                             │
//!                             ▼
//!                  ┌─────────────────────┐
//!                  │ body decode         │
//!                  │ timestamp convert   │
//!                  │ sort (sent, rowid)  │
//!                  └─────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chatlens_core::{Config, Extractor};
//!
//! let config = Config::load()?;
//! let result = Extractor::from_config(&config).run()?;
//! println!("Extracted {} messages from {} chats", result.messages, result.chats);
//! ```

pub mod body;
mod preview;
pub mod source;
pub mod timestamp;

use crate::config::Config;
use crate::error::Result;
use crate::snapshot;
use crate::types::{Record, Service};
use preview::ChatMeta;
use source::MessageStore;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Result of a full extraction run.
#[derive(Debug, Default)]
pub struct ExtractResult {
    /// Number of messages written to the snapshot
    pub messages: usize,
    /// Number of chats present in the store
    pub chats: usize,
    /// Number of messages whose body blob could not be decoded
    pub decode_failures: usize,
    /// Number of preview files written
    pub previews: usize,
}

/// Runs the store → snapshot extraction.
///
/// The extractor is responsible for:
/// - Opening the raw store read-only and validating its schema
/// - Resolving message text (plain column first, body blob second)
/// - Converting store-native timestamps to UTC
/// - Writing the sorted snapshot, then the per-chat previews
pub struct Extractor {
    store_path: PathBuf,
    snapshot_path: PathBuf,
    preview_dir: PathBuf,
}

impl Extractor {
    /// Create an extractor with explicit paths.
    pub fn new(store_path: PathBuf, snapshot_path: PathBuf, preview_dir: PathBuf) -> Self {
        Self {
            store_path,
            snapshot_path,
            preview_dir,
        }
    }

    /// Create an extractor using the configured paths.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.store_path(),
            Config::snapshot_path(),
            Config::preview_dir(),
        )
    }

    /// Run the full extraction.
    pub fn run(&self) -> Result<ExtractResult> {
        self.run_with_progress(|_, _| {})
    }

    /// Run the full extraction with a progress callback.
    ///
    /// The callback receives `(current_message_index, total_messages)` while
    /// store rows are transformed, so callers can drive a progress bar.
    pub fn run_with_progress<F>(&self, mut on_progress: F) -> Result<ExtractResult>
    where
        F: FnMut(usize, usize),
    {
        tracing::info!(path = %self.store_path.display(), "Opening message store");
        let store = MessageStore::open(&self.store_path)?;

        let raw = store.fetch_messages()?;
        let chats = store.fetch_chats()?;
        let participants = store.fetch_participants()?;

        let total = raw.len();
        let mut records = Vec::with_capacity(total);
        let mut decode_failures = 0;

        for (i, msg) in raw.into_iter().enumerate() {
            on_progress(i, total);

            let text = match msg.text {
                Some(t) if !t.is_empty() => t,
                _ => match &msg.body {
                    Some(blob) => body::decode_body(blob).unwrap_or_else(|| {
                        decode_failures += 1;
                        tracing::debug!(rowid = msg.rowid, "Undecodable message body");
                        String::new()
                    }),
                    None => String::new(),
                },
            };

            records.push(Record {
                rowid: msg.rowid,
                chat_id: msg.chat_rowid.to_string(),
                text,
                sent_at: timestamp::apple_ns_to_utc(msg.date_ns),
                is_from_me: msg.is_from_me,
                service: Service::from_store(msg.service.as_deref()),
            });
        }

        // The store query already orders rows, but the snapshot ordering
        // invariant belongs to us, not to SQLite.
        records.sort_by_key(|r| (r.sent_at, r.rowid));

        snapshot::write(&self.snapshot_path, &records)?;

        let mut meta = BTreeMap::new();
        for (rowid, chat) in &chats {
            meta.insert(
                rowid.to_string(),
                ChatMeta {
                    title: chat.title(),
                    participants: participants.get(rowid).cloned().unwrap_or_default(),
                },
            );
        }
        let previews = preview::write_previews(&self.preview_dir, &records, &meta)?;

        let result = ExtractResult {
            messages: records.len(),
            chats: chats.len(),
            decode_failures,
            previews,
        };

        if result.decode_failures > 0 {
            tracing::warn!(
                count = result.decode_failures,
                "Some message bodies could not be decoded"
            );
        }
        tracing::info!(
            messages = result.messages,
            chats = result.chats,
            previews = result.previews,
            "Extraction complete"
        );
        Ok(result)
    }
}
