//! Compaction Module
//!
//! Merges several datafiles into one, keeping only the latest record per key.
//!
//! ## Phases
//! 0. **Validate**: inputs strictly increasing; the output takes the place of
//!    the newest input, or is a fresh id above it with no other datafile in
//!    between. The merged records then still sort before anything newer.
//! 1. **Collect**: read inputs oldest → newest; a later record for a key
//!    replaces the earlier one. Keys whose indexed record lives in a datafile
//!    outside the inputs were overwritten later and are dropped.
//! 2. **Write**: write the survivors to a staging file and fsync it
//! 3. **Install**: under the index write lock, rename the staging file onto
//!    the output path, repoint the index, delete the inputs
//!
//! Nothing observable changes before phase 3, so a failed merge can simply be
//! run again. The output may be one of the inputs (merged in place); since the
//! staging file replaces it by rename, readers see either the old file with old
//! locators or the new file with new locators.
//!
//! Keys missing from the index (written before the engine was opened) are
//! copied but only indexed when no datafile newer than the inputs exists: such
//! a datafile may hold a later record the index never saw.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use parking_lot::RwLock;

use crate::error::{LogKvError, Result};
use crate::index::{HashIndex, Locator};
use crate::record::Record;
use crate::storage::{Datafile, DatafileId, DatafileManager};

/// Outcome of a merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Number of input datafiles
    pub inputs: usize,
    /// Records decoded from the inputs
    pub records_read: usize,
    /// Records written to the output (one per distinct live key)
    pub records_written: usize,
    /// Combined size of the inputs
    pub bytes_before: u64,
    /// Size of the output
    pub bytes_after: u64,
}

/// A record that goes into the merge output
struct Survivor {
    record: Record,
    /// Point the index at the copy once installed
    index: bool,
}

/// Merges datafiles of one data directory
pub struct Compactor {
    manager: DatafileManager,
    separator: char,
}

impl Compactor {
    pub fn new(manager: DatafileManager, separator: char) -> Self {
        Self { manager, separator }
    }

    /// Merge `inputs` (oldest → newest) into `output`
    ///
    /// The caller must hold off writers to the data directory for the
    /// duration; the engine does this with its writer lock.
    pub fn merge(
        &self,
        inputs: &[Datafile],
        output: &Datafile,
        index: &RwLock<HashIndex>,
    ) -> Result<MergeStats> {
        let existing = self.manager.list_datafiles()?;
        Self::validate(inputs, output, &existing)?;

        if inputs.is_empty() {
            return Ok(MergeStats::default());
        }

        let mut stats = MergeStats {
            inputs: inputs.len(),
            ..MergeStats::default()
        };
        for input in inputs {
            stats.bytes_before += input.size()?;
        }

        // Phase 1: collect
        let input_ids: HashSet<DatafileId> = inputs.iter().map(Datafile::id).collect();
        let newer_outside = existing
            .iter()
            .any(|d| d.id() > output.id() && !input_ids.contains(&d.id()));

        let records = self.collect(inputs, &mut stats)?;
        let survivors: Vec<Survivor> = {
            let index = index.read();
            records
                .into_iter()
                .filter_map(|record| match index.get(&record.key) {
                    None => Some(Survivor {
                        record,
                        index: !newer_outside,
                    }),
                    Some(current) if input_ids.contains(&current.datafile) => Some(Survivor {
                        record,
                        index: true,
                    }),
                    Some(_) => None,
                })
                .collect()
        };

        // Phase 2: write
        let staging = output.staging_path();
        let locators = match self.write_staging(&survivors, output, &staging) {
            Ok(locators) => locators,
            Err(e) => {
                let _ = fs::remove_file(&staging);
                return Err(e);
            }
        };
        stats.records_written = locators.len();
        stats.bytes_after = locators.last().map(|l| l.offset + l.len).unwrap_or(0);

        // Phase 3: install
        let mut index = index.write();

        if let Err(e) = fs::rename(&staging, output.path()) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }

        for (survivor, locator) in survivors.into_iter().zip(locators) {
            if survivor.index {
                index.repoint(survivor.record.key, locator);
            }
        }

        // The replaced output no longer holds stale records either
        let (mut forgotten, removal) = remove_inputs(inputs, output);
        if input_ids.contains(&output.id()) {
            forgotten.insert(output.id());
        }
        index.forget_datafiles(&forgotten);
        drop(index);
        removal?;

        tracing::info!(
            "Merged {} datafiles into {}: {} records → {} ({} → {} bytes)",
            stats.inputs,
            output.id(),
            stats.records_read,
            stats.records_written,
            stats.bytes_before,
            stats.bytes_after
        );

        Ok(stats)
    }

    /// Check input ordering and the output target
    fn validate(inputs: &[Datafile], output: &Datafile, existing: &[Datafile]) -> Result<()> {
        for pair in inputs.windows(2) {
            if pair[1].id() <= pair[0].id() {
                return Err(LogKvError::UnsortedInput {
                    previous: pair[0].id(),
                    next: pair[1].id(),
                });
            }
        }

        let (oldest, newest) = match (inputs.first(), inputs.last()) {
            (Some(first), Some(last)) => (first.id(), last.id()),
            _ => return Ok(()),
        };

        let in_place = inputs.iter().any(|d| d.id() == output.id());
        if in_place && output.id() != newest {
            return Err(LogKvError::InvalidMergeTarget(format!(
                "datafile {} is older than input {}",
                output.id(),
                newest
            )));
        }
        if !in_place {
            if output.exists() {
                return Err(LogKvError::InvalidMergeTarget(format!(
                    "datafile {} already exists and is not one of the inputs",
                    output.id()
                )));
            }
            if output.id() < newest {
                return Err(LogKvError::InvalidMergeTarget(format!(
                    "datafile {} is older than input {}",
                    output.id(),
                    newest
                )));
            }
        }

        let inputs: HashSet<DatafileId> = inputs.iter().map(Datafile::id).collect();
        if let Some(skipped) = existing
            .iter()
            .map(Datafile::id)
            .find(|id| *id > oldest && *id < output.id() && !inputs.contains(id))
        {
            return Err(LogKvError::InvalidMergeTarget(format!(
                "merging into {} would skip over datafile {}",
                output.id(),
                skipped
            )));
        }

        Ok(())
    }

    /// Read every input and keep the last record per key, in first-seen order
    fn collect(&self, inputs: &[Datafile], stats: &mut MergeStats) -> Result<Vec<Record>> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut records: Vec<Record> = Vec::new();

        for input in inputs {
            for entry in input.reader(self.separator)? {
                let entry = entry?;
                stats.records_read += 1;

                match positions.get(&entry.record.key) {
                    Some(&pos) => records[pos] = entry.record,
                    None => {
                        positions.insert(entry.record.key.clone(), records.len());
                        records.push(entry.record);
                    }
                }
            }
        }

        tracing::debug!(
            "Collected {} distinct keys from {} records",
            records.len(),
            stats.records_read
        );
        Ok(records)
    }

    /// Write survivors to the staging file; returns their new locators
    fn write_staging(
        &self,
        survivors: &[Survivor],
        output: &Datafile,
        staging: &Path,
    ) -> Result<Vec<Locator>> {
        let file = File::create(staging)?;
        let mut writer = BufWriter::new(file);

        let mut offset = 0u64;
        let mut locators = Vec::with_capacity(survivors.len());
        for survivor in survivors {
            let line = survivor.record.encode(self.separator);
            writer.write_all(&line)?;
            locators.push(Locator::new(output.id(), offset, line.len() as u64));
            offset += line.len() as u64;
        }

        let file = writer
            .into_inner()
            .map_err(|e| LogKvError::Io(e.into_error()))?;
        file.sync_all()?;

        Ok(locators)
    }
}

/// Delete every input except the output
///
/// Keeps going past a failure; returns the ids actually removed along with the
/// first error.
fn remove_inputs(inputs: &[Datafile], output: &Datafile) -> (HashSet<DatafileId>, Result<()>) {
    let mut removed = HashSet::new();
    let mut outcome = Ok(());

    for input in inputs.iter().filter(|d| d.id() != output.id()) {
        match fs::remove_file(input.path()) {
            Ok(()) => {
                removed.insert(input.id());
            }
            Err(e) => {
                tracing::warn!("Failed to delete merged datafile {}: {}", input.id(), e);
                if outcome.is_ok() {
                    outcome = Err(e.into());
                }
            }
        }
    }

    (removed, outcome)
}
