//! # chatlens-core
//!
//! Core library for chatlens - a personal message-history analytics toolbox.
//!
//! This library provides:
//! - Extraction of a read-only message store into a flat snapshot
//! - Identity mapping and timezone localization at load time
//! - Composable filters, text search, and aggregations
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three stages:
//! - **Store (raw):** the external SQLite file, never written
//! - **Snapshot (extracted):** one flat binary table of per-message rows,
//!   rebuilt wholesale by each extraction run
//! - **Table (loaded):** the snapshot joined with the identity map and
//!   projected into a timezone, held in memory per session
//!
//! ## Example
//!
//! ```rust,no_run
//! use chatlens_core::{load, Config, Extractor, Field};
//!
//! let config = Config::load().expect("failed to load config");
//!
//! // Rebuild the snapshot from the raw store.
//! Extractor::from_config(&config).run().expect("extraction failed");
//!
//! // Load and query.
//! let table = load::load_with_config(&config).expect("load failed");
//! let koala = table.filt_any(Field::Contact, &["Koala".into()]);
//! println!("{} messages with Koala", koala.len());
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use extract::{ExtractResult, Extractor};
pub use idmap::IdentityMap;
pub use table::{ContextWindow, MessageTable};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod idmap;
pub mod load;
pub mod logging;
pub mod snapshot;
pub mod table;
pub mod types;
