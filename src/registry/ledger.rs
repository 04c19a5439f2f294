use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::persistence::tmp_sibling;
use crate::error::PersistenceError;

/// One successful registration. Records are appended once and never rewritten.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub name: String,
    pub pid: u64,
    pub leaf_index: usize,
}

/// Append-only store of registrations, looked up by pid.
///
/// When several records share a pid the first one wins.
pub trait Ledger: Send + Sync {
    fn find_by_pid(&self, pid: u64) -> Result<Option<LedgerRecord>, PersistenceError>;

    fn append(&mut self, record: LedgerRecord) -> Result<(), PersistenceError>;

    /// All records in arrival order.
    fn records(&self) -> Result<Vec<LedgerRecord>, PersistenceError>;

    /// Drops the records whose `leaf_index` is not below `size` and returns them.
    ///
    /// Such records point at leaves the tree never kept, and would otherwise hand their pid the proof
    /// of whoever gets that index next.
    fn discard_beyond(&mut self, size: usize) -> Result<Vec<LedgerRecord>, PersistenceError>;
}

/// Ledger kept in a text file, one `name pid leaf_index` line per record.
///
/// Every lookup scans the whole file. Names containing spaces or quotes are quoted, blank lines are skipped.
#[derive(Clone, Debug)]
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileLedger { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reader(&self) -> Result<Option<csv::Reader<std::fs::File>>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let rdr = csv::ReaderBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .from_path(&self.path)?;
        Ok(Some(rdr))
    }
}

impl Ledger for FileLedger {
    fn find_by_pid(&self, pid: u64) -> Result<Option<LedgerRecord>, PersistenceError> {
        let Some(mut rdr) = self.reader()? else {
            return Ok(None);
        };

        for result in rdr.deserialize() {
            let record: LedgerRecord = result?;
            if record.pid == pid {
                return Ok(Some(record));
            }
        }

        Ok(None)
    }

    fn append(&mut self, record: LedgerRecord) -> Result<(), PersistenceError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .from_writer(file);
        wtr.serialize(&record)?;

        let file = wtr.into_inner().map_err(|e| e.into_error())?;
        file.sync_data()?;
        Ok(())
    }

    fn records(&self) -> Result<Vec<LedgerRecord>, PersistenceError> {
        let Some(mut rdr) = self.reader()? else {
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        for result in rdr.deserialize() {
            records.push(result?);
        }
        Ok(records)
    }

    fn discard_beyond(&mut self, size: usize) -> Result<Vec<LedgerRecord>, PersistenceError> {
        let (kept, discarded): (Vec<_>, Vec<_>) = self
            .records()?
            .into_iter()
            .partition(|record| record.leaf_index < size);
        if discarded.is_empty() {
            return Ok(discarded);
        }

        // rewritten through a sibling file so a crash keeps either the old or the new ledger
        let tmp_path = tmp_sibling(&self.path);
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .from_writer(File::create(&tmp_path)?);
        for record in &kept {
            wtr.serialize(record)?;
        }

        let file = wtr.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;

        Ok(discarded)
    }
}

/// In-memory ledger indexed by pid. Nothing survives the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger {
    records: Vec<LedgerRecord>,
    by_pid: HashMap<u64, usize>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Ledger for MemoryLedger {
    fn find_by_pid(&self, pid: u64) -> Result<Option<LedgerRecord>, PersistenceError> {
        Ok(self
            .by_pid
            .get(&pid)
            .map(|position| self.records[*position].clone()))
    }

    fn append(&mut self, record: LedgerRecord) -> Result<(), PersistenceError> {
        self.by_pid.entry(record.pid).or_insert(self.records.len());
        self.records.push(record);
        Ok(())
    }

    fn records(&self) -> Result<Vec<LedgerRecord>, PersistenceError> {
        Ok(self.records.clone())
    }

    fn discard_beyond(&mut self, size: usize) -> Result<Vec<LedgerRecord>, PersistenceError> {
        let (kept, discarded): (Vec<_>, Vec<_>) = self
            .records
            .drain(..)
            .partition(|record| record.leaf_index < size);

        self.by_pid.clear();
        for record in kept {
            self.append(record)?;
        }
        Ok(discarded)
    }
}
