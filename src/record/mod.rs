//! Record Module
//!
//! Line-oriented encoding of key-value pairs.
//!
//! ## Responsibilities
//! - Encode a key-value pair into a single newline-terminated line
//! - Decode a line back into its key and value
//! - Reject keys/values that would break the line format
//! - Sequentially scan a datafile (for compaction)
//!
//! ## Record Format
//! ```text
//! ┌─────────────┬─────┬───────────────┬──────┐
//! │ Key (UTF-8) │ SEP │ Value (UTF-8) │ '\n' │
//! └─────────────┴─────┴───────────────┴──────┘
//! ```
//! Decoding splits on the *first* separator, so a value may contain the
//! separator but a key may not. Neither may contain a newline.

mod codec;
mod reader;

pub use codec::{decode_record, encode_record};
pub use reader::{DatafileReader, RecordEntry};

/// Default field separator between key and value
pub const DEFAULT_SEPARATOR: char = ',';

/// Record terminator
pub(crate) const NEWLINE: u8 = b'\n';

/// A single key-value pair as stored in a datafile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub value: String,
}

impl Record {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Check that the record survives a round trip through the line format
    pub fn validate(&self, separator: char) -> crate::Result<()> {
        validate(&self.key, &self.value, separator)
    }

    /// Encode this record with the given separator
    pub fn encode(&self, separator: char) -> Vec<u8> {
        encode_record(&self.key, &self.value, separator)
    }

    /// Size of the encoded record in bytes
    pub fn encoded_len(&self, separator: char) -> usize {
        self.key.len() + separator.len_utf8() + self.value.len() + 1
    }
}

/// Check a key/value pair against the line format rules
pub fn validate(key: &str, value: &str, separator: char) -> crate::Result<()> {
    if key.contains(separator) {
        return Err(crate::LogKvError::InvalidRecord(format!(
            "key {:?} contains the separator {:?}",
            key, separator
        )));
    }
    if key.contains('\n') {
        return Err(crate::LogKvError::InvalidRecord(format!(
            "key {:?} contains a newline",
            key
        )));
    }
    if value.contains('\n') {
        return Err(crate::LogKvError::InvalidRecord(format!(
            "value for key {:?} contains a newline",
            key
        )));
    }
    Ok(())
}
