//! User-maintained identity map
//!
//! A TOML document mapping chat ids to display names, edited by hand with
//! the previews open in a browser. The map is sparse: chats without an
//! entry resolve to the [`UNMAPPED`] sentinel. Keys with symbols (phone
//! numbers, emails) need TOML quoting:
//!
//! ```toml
//! "7" = "Koala"
//! "12" = "Koala"
//! "+15550001111" = "Mom"
//! ```
//!
//! The map is read fresh on every load and never touches the snapshot.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Contact value for chat ids without a map entry.
pub const UNMAPPED: &str = "other";

/// Immutable chat id → display name mapping for one session.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    entries: BTreeMap<String, String>,
}

impl IdentityMap {
    /// Load the map from a TOML file. A missing file is not an error: it
    /// yields the empty map, and every contact resolves to the sentinel.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "No identity map file");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let map = Self::parse(&raw)?;
        tracing::debug!(path = %path.display(), entries = map.len(), "Loaded identity map");
        Ok(map)
    }

    /// Parse a TOML document of string → string pairs.
    pub fn parse(raw: &str) -> Result<Self> {
        let entries: BTreeMap<String, String> =
            toml::from_str(raw).map_err(|e| Error::MappingFormat(e.to_string()))?;
        Ok(Self { entries })
    }

    /// Resolve a chat id to its display name, or the sentinel.
    pub fn resolve(&self, chat_id: &str) -> &str {
        self.entries
            .get(chat_id)
            .map(String::as_str)
            .unwrap_or(UNMAPPED)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
