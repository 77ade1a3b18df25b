//! Record codec
//!
//! Encoding and decoding functions for the datafile line format.

use crate::error::{LogKvError, Result};

use super::{Record, NEWLINE};

/// Encode a key-value pair to bytes
///
/// Format: key + separator + value + '\n'. Inputs are assumed to pass
/// [`super::validate`]; the engine checks before calling this.
pub fn encode_record(key: &str, value: &str, separator: char) -> Vec<u8> {
    let mut sep = [0u8; 4];
    let sep = separator.encode_utf8(&mut sep).as_bytes();

    let mut line = Vec::with_capacity(key.len() + sep.len() + value.len() + 1);
    line.extend_from_slice(key.as_bytes());
    line.extend_from_slice(sep);
    line.extend_from_slice(value.as_bytes());
    line.push(NEWLINE);
    line
}

/// Decode a single newline-terminated line
///
/// Splits on the first occurrence of the separator.
pub fn decode_record(line: &[u8], separator: char) -> Result<Record> {
    let body = match line.split_last() {
        Some((&NEWLINE, body)) => body,
        _ => {
            return Err(LogKvError::MalformedRecord(format!(
                "record of {} bytes is not newline-terminated",
                line.len()
            )))
        }
    };

    let text = std::str::from_utf8(body).map_err(|e| {
        LogKvError::MalformedRecord(format!("record is not valid UTF-8: {}", e))
    })?;

    if text.contains('\n') {
        return Err(LogKvError::MalformedRecord(
            "record spans more than one line".to_string(),
        ));
    }

    match text.split_once(separator) {
        Some((key, value)) => Ok(Record::new(key, value)),
        None => Err(LogKvError::MalformedRecord(format!(
            "no separator {:?} in record {:?}",
            separator, text
        ))),
    }
}
