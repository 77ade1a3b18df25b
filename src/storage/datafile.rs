//! Datafile handles
//!
//! A datafile is an append-only file of records, identified by its id.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::record::DatafileReader;

/// Extension of every datafile
pub const DATAFILE_EXTENSION: &str = "data";

/// Suffix appended to a datafile path while a merge writes it
pub const STAGING_EXTENSION: &str = "merge";

/// Identifier of a datafile; higher ids hold newer records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatafileId(pub u64);

impl DatafileId {
    /// The id following this one
    pub fn next(self) -> Self {
        DatafileId(self.0 + 1)
    }
}

impl fmt::Display for DatafileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a datafile (which may not exist yet)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datafile {
    id: DatafileId,
    path: PathBuf,
}

impl Datafile {
    pub(crate) fn new(dir: &Path, id: DatafileId) -> Self {
        Self {
            id,
            path: Self::path_in(dir, id),
        }
    }

    /// Path of datafile `id` inside `dir`
    /// 7 → "{dir}/000007.data"
    pub fn path_in(dir: &Path, id: DatafileId) -> PathBuf {
        dir.join(format!("{:06}.{}", id.0, DATAFILE_EXTENSION))
    }

    /// Parse a datafile id from a path
    /// "000042.data" → Some(42), "notes.txt" → None
    pub fn parse_id(path: &Path) -> Option<DatafileId> {
        if path.extension()? != DATAFILE_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        stem.parse().ok().map(DatafileId)
    }

    pub fn id(&self) -> DatafileId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path the merge output is written to before it is installed
    pub fn staging_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".");
        name.push(STAGING_EXTENSION);
        PathBuf::from(name)
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Current size in bytes; a datafile that was never written has size 0
    pub fn size(&self) -> Result<u64> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Open a sequential reader over every record
    pub fn reader(&self, separator: char) -> Result<DatafileReader> {
        DatafileReader::open(&self.path, separator)
    }
}
