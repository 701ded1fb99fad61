//! Row-to-schema field mapping.
//!
//! Two modes exist. *Keyed* pairs cell `i` with the `i`-th schema field: the
//! schema's declared order is authoritative, never the document's own header
//! text. *Positional* pairs cell `i` with an explicit [`MappingEntry`], which
//! is either a direct field assignment or a transform that may derive any
//! number of record attributes from the raw cell.
//!
//! Mapping configuration is resolved once, before any row is read, via
//! [`FieldMapping::ensure_valid`]; a bad entry is a configuration error and
//! never a per-row issue.

use std::{collections::BTreeMap, fmt};

use crate::{error::ImportError, rows::RawRow, schema::Schema};

/// Raw string values keyed by field identifier, ready for validation.
///
/// Blank and missing cells are never inserted, so "absent" and "empty" are
/// the same thing by the time validation runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    values: BTreeMap<String, String>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: impl Into<String>, raw: impl Into<String>) {
        let raw = raw.into();
        if raw.is_empty() {
            return;
        }
        self.values.insert(field.into(), raw);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A transform receives the candidate values and one raw cell; it may set any
/// number of target attributes. An `Err` message becomes a row-level issue.
pub type Transform = Box<dyn Fn(&mut FieldValues, &str) -> Result<(), String> + Send + Sync>;

pub enum MappingEntry {
    /// Assign the raw cell to this field identifier.
    Assign(String),
    /// Derive one or more attributes from the raw cell.
    Transform { name: String, apply: Transform },
}

impl MappingEntry {
    pub fn assign(field: &str) -> Self {
        MappingEntry::Assign(field.to_string())
    }

    pub fn transform<F>(name: &str, apply: F) -> Self
    where
        F: Fn(&mut FieldValues, &str) -> Result<(), String> + Send + Sync + 'static,
    {
        MappingEntry::Transform {
            name: name.to_string(),
            apply: Box::new(apply),
        }
    }
}

impl fmt::Debug for MappingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingEntry::Assign(field) => f.debug_tuple("Assign").field(field).finish(),
            MappingEntry::Transform { name, .. } => {
                f.debug_tuple("Transform").field(name).finish()
            }
        }
    }
}

#[derive(Debug)]
pub enum FieldMapping {
    /// Cell `i` maps to the `i`-th schema field.
    Keyed,
    /// Cell `i` maps to the `i`-th entry.
    Positional {
        entries: Vec<MappingEntry>,
        /// Leave the target at its default when the cell is blank.
        skip_blank: bool,
    },
}

impl FieldMapping {
    pub fn keyed() -> Self {
        FieldMapping::Keyed
    }

    pub fn positional(entries: Vec<MappingEntry>, skip_blank: bool) -> Self {
        FieldMapping::Positional {
            entries,
            skip_blank,
        }
    }

    /// Builds an assignment-only positional mapping from field identifiers.
    pub fn positional_fields(fields: &[String], skip_blank: bool) -> Self {
        let entries = fields
            .iter()
            .map(|f| MappingEntry::Assign(f.trim().to_string()))
            .collect();
        FieldMapping::Positional {
            entries,
            skip_blank,
        }
    }

    /// Fails fast on entries that cannot be resolved against the schema.
    pub fn ensure_valid(&self, schema: &Schema) -> Result<(), ImportError> {
        let FieldMapping::Positional { entries, .. } = self else {
            return Ok(());
        };
        if entries.is_empty() {
            return Err(ImportError::Configuration(
                "positional mapping declares no entries".to_string(),
            ));
        }
        for entry in entries {
            if let MappingEntry::Assign(field) = entry {
                if schema.field(field).is_none() {
                    return Err(ImportError::Configuration(format!(
                        "mapping entry targets unknown field '{field}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Converts one raw row into field values. `Err` carries a row-level
    /// message from a failed transform; it never aborts the batch.
    pub fn apply(&self, schema: &Schema, row: &RawRow) -> Result<FieldValues, String> {
        let mut values = FieldValues::new();
        match self {
            FieldMapping::Keyed => {
                // Trailing cells beyond the schema are ignored; missing
                // cells stay absent.
                for (field, cell) in schema.fields.iter().zip(row.cells.iter()) {
                    values.set(field.name.clone(), cell.clone());
                }
            }
            FieldMapping::Positional {
                entries,
                skip_blank,
            } => {
                for (idx, entry) in entries.iter().enumerate() {
                    let cell = row.cell(idx);
                    if *skip_blank && cell.is_empty() {
                        continue;
                    }
                    match entry {
                        MappingEntry::Assign(field) => values.set(field.clone(), cell),
                        MappingEntry::Transform { apply, .. } => apply(&mut values, cell)?,
                    }
                }
            }
        }
        Ok(values)
    }
}
