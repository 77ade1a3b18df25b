//! # logkv
//!
//! A log-structured key-value store with:
//! - Append-only datafiles rotated at a size threshold
//! - An in-memory hash index for O(1) point lookups
//! - Compaction that merges datafiles and keeps the latest value per key
//! - A TCP front end (single writer / multi reader)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Engine                                  │
//! │            (Single Writer / Multi Reader)                    │
//! └──────┬──────────────────────┬──────────────────────┬────────┘
//!        │ set                  │ get                  │ merge
//!        ▼                      ▼                      ▼
//!   ┌──────────┐         ┌─────────────┐        ┌─────────────┐
//!   │ Datafile │         │ Hash Index  │        │  Compactor  │
//!   │ Manager  │         │  (RwLock)   │        │             │
//!   └────┬─────┘         └──────┬──────┘        └──────┬──────┘
//!        │                      │ (datafile, offset)   │
//!        ▼                      ▼                      ▼
//!   ┌─────────────────────────────────────────────────────────┐
//!   │       000000.data   000001.data   000002.data ...        │
//!   │                "key,value\n" records                     │
//!   └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use logkv::{Config, Engine};
//!
//! # fn main() -> logkv::Result<()> {
//! let engine = Engine::open(Config::builder().data_dir("./data").build())?;
//! engine.set("a", "1")?;
//! engine.set("a", "3")?;
//! assert_eq!(engine.get("a")?, Some("3".to_string()));
//! assert_eq!(engine.get("missing")?, None);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod storage;
pub mod index;
pub mod compaction;
pub mod engine;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LogKvError, Result};
pub use config::{Config, SyncStrategy};
pub use engine::Engine;
pub use compaction::MergeStats;
pub use storage::{Datafile, DatafileId};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of logkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
