//! Index Module
//!
//! In-memory hash index mapping every key to the location of its latest record.
//!
//! ## Responsibilities
//! - O(1) key → locator lookups
//! - Track how many bytes on disk are still referenced (live) and how many
//!   were superseded by later writes (stale), per datafile
//!
//! The index is never persisted; it starts empty when the engine opens.

mod hash_index;

pub use hash_index::HashIndex;

use crate::storage::DatafileId;

/// Location of a record on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    /// Datafile holding the record
    pub datafile: DatafileId,

    /// Byte offset of the start of the record
    pub offset: u64,

    /// Encoded length including the trailing newline
    pub len: u64,
}

impl Locator {
    pub fn new(datafile: DatafileId, offset: u64, len: u64) -> Self {
        Self {
            datafile,
            offset,
            len,
        }
    }
}
