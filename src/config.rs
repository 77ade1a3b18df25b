//! Configuration for logkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{LogKvError, Result};

/// Main configuration for a logkv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory holding every datafile
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── 000000.data
    ///     ├── 000001.data
    ///     └── ...
    pub data_dir: PathBuf,

    /// Field delimiter between key and value in a record line
    pub separator: char,

    /// Rotate to a new datafile once the active one grows past this many bytes
    pub size_threshold: u64,

    /// How often appends are fsynced
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Compaction Configuration
    // -------------------------------------------------------------------------
    /// Compact sealed datafiles automatically once stale bytes make up at
    /// least this fraction of indexed bytes. `None` disables the trigger.
    pub merge_waste_ratio: Option<f64>,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Number of worker threads serving connections
    pub worker_threads: usize,

    /// Max accepted connections waiting for a worker
    pub max_connections: usize,

    /// Connection read timeout (milliseconds)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds)
    pub write_timeout_ms: u64,
}

/// Append sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced writes
    EveryNWrites { count: usize },

    /// Leave flushing to the operating system
    Never,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./logkv_data"),
            separator: ',',
            size_threshold: 4 * 1024 * 1024, // 4 MB
            sync_strategy: SyncStrategy::Never,
            merge_waste_ratio: None,
            listen_addr: "127.0.0.1:7379".to_string(),
            worker_threads: 4,
            max_connections: 1024,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the storage layer cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.separator == '\n' {
            return Err(LogKvError::Config(
                "separator cannot be a newline".to_string(),
            ));
        }
        if let Some(ratio) = self.merge_waste_ratio {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(LogKvError::Config(format!(
                    "merge waste ratio must be in (0, 1], got {}",
                    ratio
                )));
            }
        }
        if let SyncStrategy::EveryNWrites { count: 0 } = self.sync_strategy {
            return Err(LogKvError::Config(
                "sync interval must be at least one write".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all datafiles)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the record separator
    pub fn separator(mut self, separator: char) -> Self {
        self.config.separator = separator;
        self
    }

    /// Set the rotation threshold (in bytes)
    pub fn size_threshold(mut self, bytes: u64) -> Self {
        self.config.size_threshold = bytes;
        self
    }

    /// Set the append sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Enable automatic compaction at the given stale-byte ratio
    pub fn merge_waste_ratio(mut self, ratio: f64) -> Self {
        self.config.merge_waste_ratio = Some(ratio);
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of connection worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the maximum number of queued connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
