//! Target record stores with staged, all-or-nothing persistence.
//!
//! A store exposes one batch-scoped unit of work: records are staged during
//! the open batch, become durable only on [`RecordStore::commit`], and vanish
//! without trace on [`RecordStore::abort`]. Uniqueness probes see both
//! committed records and rows staged earlier in the same batch, so later
//! rows can collide with earlier ones before anything is durable.
//!
//! [`MemoryStore`] backs library callers and tests; [`CsvStore`] writes the
//! committed batch to a destination file, which is only created at commit
//! time.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

use crate::{
    data::{Record, Value},
    io_utils::{self, Dialect},
    schema::Schema,
};

pub trait RecordStore {
    /// Stages one validated record inside the open batch.
    fn stage(&mut self, record: Record) -> Result<()>;

    /// True when `value` is already present for `field`, whether committed
    /// or staged earlier in this batch.
    fn exists(&self, field: &str, value: &Value) -> bool;

    /// Makes every staged record durable; returns how many were written.
    fn commit(&mut self) -> Result<usize>;

    /// Discards every staged record, leaving zero residual writes.
    fn abort(&mut self);
}

/// In-memory store: committed records survive across batches, staged ones
/// only until commit/abort.
#[derive(Debug, Default)]
pub struct MemoryStore {
    committed: Vec<Record>,
    staged: Vec<Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.committed
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn stage(&mut self, record: Record) -> Result<()> {
        self.staged.push(record);
        Ok(())
    }

    fn exists(&self, field: &str, value: &Value) -> bool {
        self.committed
            .iter()
            .chain(self.staged.iter())
            .any(|record| record.get(field) == Some(value))
    }

    fn commit(&mut self) -> Result<usize> {
        let count = self.staged.len();
        self.committed.append(&mut self.staged);
        debug!("Committed {count} staged record(s)");
        Ok(count)
    }

    fn abort(&mut self) {
        let discarded = self.staged.len();
        self.staged.clear();
        debug!("Aborted batch, discarded {discarded} staged record(s)");
    }
}

/// File-backed store: the destination CSV (header row of field identifiers
/// plus one line per record, in schema field order) is created only when the
/// batch commits. An aborted batch leaves no file behind.
pub struct CsvStore {
    schema: Schema,
    destination: PathBuf,
    dialect: Dialect,
    staged: Vec<Record>,
}

impl CsvStore {
    pub fn new(schema: Schema, destination: &Path, dialect: Dialect) -> Self {
        Self {
            schema,
            destination: destination.to_path_buf(),
            dialect,
            staged: Vec::new(),
        }
    }
}

impl RecordStore for CsvStore {
    fn stage(&mut self, record: Record) -> Result<()> {
        self.staged.push(record);
        Ok(())
    }

    fn exists(&self, field: &str, value: &Value) -> bool {
        self.staged
            .iter()
            .any(|record| record.get(field) == Some(value))
    }

    fn commit(&mut self) -> Result<usize> {
        let mut writer = io_utils::open_csv_writer(Some(&self.destination), &self.dialect)
            .with_context(|| format!("Opening destination {:?}", self.destination))?;
        writer
            .write_record(self.schema.field_names())
            .context("Writing destination header")?;
        for record in &self.staged {
            let cells: Vec<String> = self
                .schema
                .field_names()
                .map(|name| {
                    record
                        .get(name)
                        .map(Value::as_display)
                        .unwrap_or_default()
                })
                .collect();
            writer.write_record(&cells).context("Writing record")?;
        }
        writer.flush().context("Flushing destination")?;
        let count = self.staged.len();
        self.staged.clear();
        debug!(
            "Committed {count} record(s) to {:?}",
            self.destination
        );
        Ok(count)
    }

    fn abort(&mut self) {
        let discarded = self.staged.len();
        self.staged.clear();
        debug!("Aborted batch, discarded {discarded} staged record(s)");
    }
}
