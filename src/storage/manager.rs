//! Datafile Manager
//!
//! Owns the data directory and the rotation policy.
//!
//! ## Responsibilities
//! - Discover datafiles, ordered by numeric id
//! - Select the write target (size-then-rotate)
//! - Hand out fresh datafile ids for merge outputs
//! - Delete everything on `clear`

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::datafile::STAGING_EXTENSION;
use super::{Datafile, DatafileId};

/// Manages the datafiles of one data directory
///
/// Holds no open file handles and no cached listing: every call reads the
/// directory, so the on-disk state is the single source of truth.
#[derive(Debug, Clone)]
pub struct DatafileManager {
    /// Directory where datafiles are stored
    data_dir: PathBuf,

    /// Rotate once the active datafile is strictly larger than this
    size_threshold: u64,
}

impl DatafileManager {
    /// Open or create the data directory
    ///
    /// Merge staging files left behind by an interrupted merge are removed;
    /// their inputs were never deleted, so nothing is lost.
    pub fn open(path: &Path, size_threshold: u64) -> Result<Self> {
        fs::create_dir_all(path)?;

        let manager = Self {
            data_dir: path.to_path_buf(),
            size_threshold,
        };

        for staging in manager.staging_files()? {
            tracing::warn!("Removing unfinished merge output {}", staging.display());
            fs::remove_file(&staging)?;
        }

        Ok(manager)
    }

    /// List all datafiles, oldest → newest
    pub fn list_datafiles(&self) -> Result<Vec<Datafile>> {
        let mut ids: Vec<DatafileId> = Vec::new();

        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            let file_path = entry.path();

            if file_path.is_file() {
                if let Some(id) = Datafile::parse_id(&file_path) {
                    ids.push(id);
                }
            }
        }

        // Numeric order: "000010" must come after "000009" however it is named
        ids.sort_unstable();

        Ok(ids
            .into_iter()
            .map(|id| Datafile::new(&self.data_dir, id))
            .collect())
    }

    /// Select the datafile the next write goes to
    ///
    /// - No datafiles yet → id 0
    /// - Highest datafile larger than the threshold → a new id after it
    /// - Otherwise → the highest datafile
    ///
    /// The check happens before the write, so a datafile may overshoot the
    /// threshold by one record; the following write rotates.
    pub fn select_write_target(&self) -> Result<Datafile> {
        let datafiles = self.list_datafiles()?;

        let current = match datafiles.last() {
            Some(current) => current,
            None => return Ok(self.datafile(DatafileId(0))),
        };

        let size = current.size()?;
        if size > self.size_threshold {
            let next = current.id().next();
            tracing::debug!(
                "Datafile {} is {} bytes (threshold {}), rotating to {}",
                current.id(),
                size,
                self.size_threshold,
                next
            );
            return Ok(self.datafile(next));
        }

        Ok(current.clone())
    }

    /// Handle for a datafile that does not exist yet, newer than all others
    pub fn next_datafile(&self) -> Result<Datafile> {
        let next = self
            .list_datafiles()?
            .last()
            .map(|d| d.id().next())
            .unwrap_or(DatafileId(0));
        Ok(self.datafile(next))
    }

    /// Handle for datafile `id` (it may or may not exist)
    pub fn datafile(&self, id: DatafileId) -> Datafile {
        Datafile::new(&self.data_dir, id)
    }

    /// Total size of all datafiles in bytes
    pub fn total_size(&self) -> Result<u64> {
        let mut total = 0;
        for datafile in self.list_datafiles()? {
            total += datafile.size()?;
        }
        Ok(total)
    }

    /// Delete every datafile and staging file
    ///
    /// Returns the number of datafiles removed.
    pub fn clear(&self) -> Result<usize> {
        let datafiles = self.list_datafiles()?;
        for datafile in &datafiles {
            fs::remove_file(datafile.path())?;
        }
        for staging in self.staging_files()? {
            fs::remove_file(&staging)?;
        }
        Ok(datafiles.len())
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the rotation threshold
    pub fn size_threshold(&self) -> u64 {
        self.size_threshold
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Staging files of merges that never got installed
    fn staging_files(&self) -> Result<Vec<PathBuf>> {
        let mut staging = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            let is_staging = path.is_file()
                && path.extension().map_or(false, |ext| ext == STAGING_EXTENSION)
                && path.file_stem().map(Path::new).and_then(Datafile::parse_id).is_some();
            if is_staging {
                staging.push(path);
            }
        }
        Ok(staging)
    }
}
