//! Engine Module
//!
//! The storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Append records to the active datafile and index their offsets
//! - Serve point lookups with one index lookup and one disk seek
//! - Run merges without losing concurrent writes or exposing dead locators
//! - Bootstrap/teardown of the data directory

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use parking_lot::{Mutex, RwLock};

use crate::compaction::{Compactor, MergeStats};
use crate::config::{Config, SyncStrategy};
use crate::error::{LogKvError, Result};
use crate::index::{HashIndex, Locator};
use crate::protocol::Command;
use crate::record::{self, decode_record, encode_record, Record};
use crate::storage::{Datafile, DatafileId, DatafileManager};

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (set/merge/compact/clear): Serialized by `writer`
///   - Only ONE write operation at a time
///   - Lock order: writer → index (write)
///
/// - **Reads** (get): Concurrent
///   - Hold the index read lock across the file read, so a merge can never
///     delete a datafile between lookup and seek
///
/// Callers must not modify the data directory behind the engine's back.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Datafile discovery and rotation policy
    manager: DatafileManager,

    /// Key → latest record location
    index: RwLock<HashIndex>,

    /// Append handle for the active datafile; also the writer lock
    writer: Mutex<ActiveWriter>,

    compactor: Compactor,
}

/// Cached append handle
struct ActiveWriter {
    file: Option<(DatafileId, File)>,

    /// Appends since the last fsync
    unsynced: usize,

    sync_strategy: SyncStrategy,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Validate config
    /// 2. Create data directory if missing, drop unfinished merge outputs
    /// 3. Start with an empty index (existing records are not replayed)
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let manager = DatafileManager::open(&config.data_dir, config.size_threshold)?;

        let existing = manager.list_datafiles()?.len();
        tracing::debug!(
            "Opened data directory {} ({} existing datafiles)",
            config.data_dir.display(),
            existing
        );

        Ok(Self {
            compactor: Compactor::new(manager.clone(), config.separator),
            writer: Mutex::new(ActiveWriter::new(config.sync_strategy)),
            index: RwLock::new(HashIndex::new()),
            manager,
            config,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers
    pub fn execute(&self, command: Command) -> Result<Option<String>> {
        match command {
            Command::Get { key } => self.get(&key),
            Command::Set { key, value } => {
                self.set(&key, &value)?;
                Ok(None)
            }
            Command::Compact => match self.compact()? {
                Some(stats) => Ok(Some(format!(
                    "merged {} datafiles: {} records -> {} ({} -> {} bytes)",
                    stats.inputs,
                    stats.records_read,
                    stats.records_written,
                    stats.bytes_before,
                    stats.bytes_after
                ))),
                None => Ok(Some("nothing to compact".to_string())),
            },
            Command::Ping => Ok(Some("PONG".to_string())),
        }
    }

    /// Get a value by key
    ///
    /// Returns `Ok(None)` for a key that was never set.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let index = self.index.read();

        let locator = match index.get(key) {
            Some(locator) => locator,
            None => return Ok(None),
        };

        // Read while holding the lock: the locator must not be repointed mid-read
        let record = self.read_record(key, locator)?;
        drop(index);

        Ok(Some(record.value))
    }

    /// Set a key-value pair
    ///
    /// Steps:
    /// 1. Validate and encode
    /// 2. Acquire writer lock, select the target datafile
    /// 3. Append, remembering the offset before the write
    /// 4. Point the index at the new record
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        record::validate(key, value, self.config.separator)?;
        let line = encode_record(key, value, self.config.separator);

        let mut writer = self.writer.lock();

        let target = self.manager.select_write_target()?;
        let offset = writer.append(&target, &line)?;

        let locator = Locator::new(target.id(), offset, line.len() as u64);
        self.index.write().insert(key.to_string(), locator);

        if let Some(ratio) = self.config.merge_waste_ratio {
            if let Err(e) = self.maybe_compact(&mut writer, ratio) {
                // The write itself landed; a failed merge only leaves space unreclaimed
                tracing::warn!("Automatic compaction failed: {}", e);
            }
        }

        Ok(())
    }

    /// Merge `inputs` (ordered oldest → newest) into `output`
    ///
    /// `output` must be the newest input or a datafile that does not exist
    /// yet with a higher id (see [`Engine::next_datafile`]). No other datafile
    /// may sit between the oldest input and `output`.
    pub fn merge(&self, inputs: &[Datafile], output: &Datafile) -> Result<MergeStats> {
        let mut writer = self.writer.lock();
        self.merge_locked(&mut writer, inputs, output)
    }

    /// Merge every sealed datafile (all but the active one) in place
    ///
    /// Returns `None` when there is no sealed datafile.
    pub fn compact(&self) -> Result<Option<MergeStats>> {
        let mut writer = self.writer.lock();
        self.compact_locked(&mut writer)
    }

    /// Delete every datafile and reset the index
    pub fn clear(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.file = None;
        writer.unsynced = 0;

        let mut index = self.index.write();
        let removed = self.manager.clear()?;
        index.clear();

        tracing::info!("Cleared {} datafiles from {}", removed, self.data_dir().display());
        Ok(())
    }

    /// Force the active datafile to disk
    pub fn sync(&self) -> Result<()> {
        self.writer.lock().sync()
    }

    /// Close the engine gracefully
    pub fn close(self) -> Result<()> {
        self.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// All datafiles, oldest → newest
    pub fn list_datafiles(&self) -> Result<Vec<Datafile>> {
        self.manager.list_datafiles()
    }

    /// Get the number of datafiles
    pub fn datafile_count(&self) -> Result<usize> {
        Ok(self.manager.list_datafiles()?.len())
    }

    /// Handle for datafile `id`
    pub fn datafile(&self, id: DatafileId) -> Datafile {
        self.manager.datafile(id)
    }

    /// Handle for a fresh datafile newer than every existing one
    pub fn next_datafile(&self) -> Result<Datafile> {
        self.manager.next_datafile()
    }

    /// Locator currently indexed for `key`
    pub fn locate(&self, key: &str) -> Option<Locator> {
        self.index.read().get(key)
    }

    /// Get the number of indexed keys
    pub fn key_count(&self) -> usize {
        self.index.read().len()
    }

    /// Fraction of indexed bytes taken by superseded records
    pub fn waste_ratio(&self) -> f64 {
        self.index.read().waste_ratio()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Read and check the record at `locator`
    fn read_record(&self, key: &str, locator: Locator) -> Result<Record> {
        let corrupt = |reason: String| LogKvError::CorruptIndex {
            key: key.to_string(),
            reason,
        };

        let datafile = self.manager.datafile(locator.datafile);
        let mut file = match File::open(datafile.path()) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(corrupt(format!(
                    "datafile {} no longer exists",
                    locator.datafile
                )))
            }
            Err(e) => return Err(e.into()),
        };

        file.seek(SeekFrom::Start(locator.offset))?;

        let mut line = vec![0u8; locator.len as usize];
        if let Err(e) = file.read_exact(&mut line) {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                return Err(corrupt(format!(
                    "offset {} (+{} bytes) is past the end of datafile {}",
                    locator.offset, locator.len, locator.datafile
                )));
            }
            return Err(e.into());
        }

        let record = decode_record(&line, self.config.separator).map_err(|e| {
            corrupt(format!(
                "{} (datafile {}, offset {})",
                e, locator.datafile, locator.offset
            ))
        })?;

        if record.key != key {
            return Err(corrupt(format!(
                "datafile {} offset {} holds key {:?}",
                locator.datafile, locator.offset, record.key
            )));
        }

        Ok(record)
    }

    /// Merge with the writer lock already held
    fn merge_locked(
        &self,
        writer: &mut ActiveWriter,
        inputs: &[Datafile],
        output: &Datafile,
    ) -> Result<MergeStats> {
        // The active datafile may be an input or be replaced by the output
        writer.release()?;
        self.compactor.merge(inputs, output, &self.index)
    }

    fn compact_locked(&self, writer: &mut ActiveWriter) -> Result<Option<MergeStats>> {
        let sealed = self.sealed_datafiles()?;
        let output = match sealed.last() {
            Some(last) => last.clone(),
            None => return Ok(None),
        };
        self.merge_locked(writer, &sealed, &output).map(Some)
    }

    /// Compact when the stale ratio is reached and sealed datafiles hold stale bytes
    fn maybe_compact(&self, writer: &mut ActiveWriter, ratio: f64) -> Result<()> {
        let sealed = self.sealed_datafiles()?;
        let (waste, sealed_stale) = {
            let index = self.index.read();
            let sealed_stale: u64 = sealed.iter().map(|d| index.stale_bytes_in(d.id())).sum();
            (index.waste_ratio(), sealed_stale)
        };

        if waste < ratio || sealed_stale == 0 {
            return Ok(());
        }

        tracing::debug!(
            "Waste ratio {:.2} reached threshold {:.2}, compacting {} datafiles",
            waste,
            ratio,
            sealed.len()
        );
        self.compact_locked(writer)?;
        Ok(())
    }

    /// Every datafile except the highest (active) one
    fn sealed_datafiles(&self) -> Result<Vec<Datafile>> {
        let mut datafiles = self.manager.list_datafiles()?;
        datafiles.pop();
        Ok(datafiles)
    }
}

impl ActiveWriter {
    fn new(sync_strategy: SyncStrategy) -> Self {
        Self {
            file: None,
            unsynced: 0,
            sync_strategy,
        }
    }

    /// Append `line` to `target`, returning the offset it was written at
    ///
    /// On failure the datafile is truncated back to that offset.
    fn append(&mut self, target: &Datafile, line: &[u8]) -> Result<u64> {
        let file = open_for_append(
            &mut self.file,
            &mut self.unsynced,
            target,
            self.sync_strategy,
        )?;

        // Offset before the write: that is where the record starts
        let offset = file.metadata()?.len();

        if let Err(e) = file.write_all(line) {
            rollback(file, target.id(), offset);
            self.file = None;
            return Err(e.into());
        }

        self.unsynced += 1;
        let due = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNWrites { count } => self.unsynced >= count,
            SyncStrategy::Never => false,
        };
        if due {
            if let Err(e) = file.sync_data() {
                rollback(file, target.id(), offset);
                self.file = None;
                return Err(e.into());
            }
            self.unsynced = 0;
        }

        Ok(offset)
    }

    fn sync(&mut self) -> Result<()> {
        if let Some((_, file)) = &self.file {
            file.sync_all()?;
        }
        self.unsynced = 0;
        Ok(())
    }

    /// Sync (per strategy) and drop the cached handle
    fn release(&mut self) -> Result<()> {
        if let Some((_, file)) = self.file.take() {
            if self.sync_strategy != SyncStrategy::Never && self.unsynced > 0 {
                file.sync_all()?;
            }
        }
        self.unsynced = 0;
        Ok(())
    }
}

/// Return the append handle for `target`, sealing the previous datafile if the
/// target changed
fn open_for_append<'a>(
    slot: &'a mut Option<(DatafileId, File)>,
    unsynced: &mut usize,
    target: &Datafile,
    sync_strategy: SyncStrategy,
) -> Result<&'a mut File> {
    match slot.take() {
        Some((id, file)) if id == target.id() => Ok(&mut slot.insert((id, file)).1),
        previous => {
            if let Some((id, file)) = previous {
                if sync_strategy != SyncStrategy::Never && *unsynced > 0 {
                    file.sync_all()?;
                    *unsynced = 0;
                }
                tracing::debug!("Sealed datafile {}", id);
            }

            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(target.path())?;
            tracing::debug!("Appending to datafile {}", target.id());

            Ok(&mut slot.insert((target.id(), file)).1)
        }
    }
}

/// Undo a partial append
fn rollback(file: &File, datafile: DatafileId, offset: u64) {
    if let Err(e) = file.set_len(offset) {
        tracing::warn!(
            "Failed to truncate datafile {} back to {} bytes: {}",
            datafile,
            offset,
            e
        );
    }
}
