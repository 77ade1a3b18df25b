//! Hash index implementation
//!
//! HashMap-based index with per-datafile stale byte accounting.

use std::collections::{HashMap, HashSet};

use crate::storage::DatafileId;

use super::Locator;

/// Key → locator map
///
/// Not synchronized on its own; the engine wraps it in a `RwLock`.
#[derive(Debug, Default)]
pub struct HashIndex {
    entries: HashMap<String, Locator>,

    /// Bytes of superseded records, by datafile
    stale_bytes: HashMap<DatafileId, u64>,

    /// Bytes of records the index points at
    live_bytes: u64,
}

impl HashIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the latest locator for a key
    pub fn get(&self, key: &str) -> Option<Locator> {
        self.entries.get(key).copied()
    }

    /// Record a new write for `key`
    ///
    /// The previous record (if any) becomes stale. Returns the old locator.
    pub fn insert(&mut self, key: String, locator: Locator) -> Option<Locator> {
        self.live_bytes += locator.len;
        let previous = self.entries.insert(key, locator);
        if let Some(old) = previous {
            self.live_bytes -= old.len;
            *self.stale_bytes.entry(old.datafile).or_insert(0) += old.len;
        }
        previous
    }

    /// Move `key` to a copy of the same record in another datafile
    ///
    /// Used by merges: the old record goes away with its datafile, so it is
    /// not counted as stale.
    pub fn repoint(&mut self, key: String, locator: Locator) -> Option<Locator> {
        self.live_bytes += locator.len;
        let previous = self.entries.insert(key, locator);
        if let Some(old) = previous {
            self.live_bytes -= old.len;
        }
        previous
    }

    /// Drop stale accounting for datafiles that were deleted
    pub fn forget_datafiles(&mut self, datafiles: &HashSet<DatafileId>) {
        self.stale_bytes.retain(|id, _| !datafiles.contains(id));
    }

    /// Number of indexed keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bytes of superseded records
    pub fn stale_bytes(&self) -> u64 {
        self.stale_bytes.values().sum()
    }

    /// Superseded bytes in one datafile
    pub fn stale_bytes_in(&self, datafile: DatafileId) -> u64 {
        self.stale_bytes.get(&datafile).copied().unwrap_or(0)
    }

    /// Total bytes of records the index points at
    pub fn live_bytes(&self) -> u64 {
        self.live_bytes
    }

    /// Fraction of tracked bytes that are stale (0.0 when nothing is tracked)
    pub fn waste_ratio(&self) -> f64 {
        let stale = self.stale_bytes();
        let total = stale + self.live_bytes;
        if total == 0 {
            return 0.0;
        }
        stale as f64 / total as f64
    }

    /// Iterate over all keys and locators (arbitrary order)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Locator)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Remove every entry and reset accounting
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stale_bytes.clear();
        self.live_bytes = 0;
    }
}
