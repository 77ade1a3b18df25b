//! Error types for logkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::storage::DatafileId;

/// Result type alias using LogKvError
pub type Result<T> = std::result::Result<T, LogKvError>;

/// Unified error type for logkv operations
#[derive(Debug, Error)]
pub enum LogKvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    /// A line read from a datafile could not be decoded
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// A key or value cannot be encoded without breaking the line format
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    // -------------------------------------------------------------------------
    // Index Errors
    // -------------------------------------------------------------------------
    /// An index locator no longer resolves to a valid record
    #[error("Corrupt index entry for key {key:?}: {reason}")]
    CorruptIndex { key: String, reason: String },

    // -------------------------------------------------------------------------
    // Compaction Errors
    // -------------------------------------------------------------------------
    /// Merge inputs were not ordered oldest to newest
    #[error("Merge inputs out of order: datafile {next} follows datafile {previous}")]
    UnsortedInput {
        previous: DatafileId,
        next: DatafileId,
    },

    #[error("Invalid merge target: {0}")]
    InvalidMergeTarget(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
