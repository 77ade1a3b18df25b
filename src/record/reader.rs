//! Datafile Reader
//!
//! Sequential iteration over every record in a datafile.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{LogKvError, Result};

use super::{decode_record, Record, NEWLINE};

/// A decoded record together with its position in the datafile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    /// Byte offset of the first byte of the record
    pub offset: u64,
    /// Encoded length including the trailing newline
    pub len: u64,
    pub record: Record,
}

/// Iterator over the records of one datafile, in file order
pub struct DatafileReader {
    reader: BufReader<File>,
    separator: char,
    /// Current position in file
    offset: u64,
    /// Reusable line buffer
    line: Vec<u8>,
    /// Set after an error so iteration stops
    done: bool,
}

impl DatafileReader {
    /// Open a datafile for sequential reading
    pub fn open(path: &Path, separator: char) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            separator,
            offset: 0,
            line: Vec::new(),
            done: false,
        })
    }

    /// Byte offset of the next record to be read
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn read_entry(&mut self) -> Result<Option<RecordEntry>> {
        self.line.clear();
        let read = self.reader.read_until(NEWLINE, &mut self.line)?;
        if read == 0 {
            return Ok(None);
        }

        if self.line.last() != Some(&NEWLINE) {
            return Err(LogKvError::MalformedRecord(format!(
                "truncated record at offset {} ({} bytes without newline)",
                self.offset, read
            )));
        }

        let record = decode_record(&self.line, self.separator).map_err(|e| match e {
            LogKvError::MalformedRecord(msg) => {
                LogKvError::MalformedRecord(format!("at offset {}: {}", self.offset, msg))
            }
            other => other,
        })?;

        let entry = RecordEntry {
            offset: self.offset,
            len: read as u64,
            record,
        };
        self.offset += read as u64;
        Ok(Some(entry))
    }
}

impl Iterator for DatafileReader {
    type Item = Result<RecordEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
