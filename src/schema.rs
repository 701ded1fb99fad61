//! Target record schema: field identifiers, display labels, constraint flags,
//! JSON persistence, and per-record validation.
//!
//! This module owns the [`Schema`] struct (the declared shape of the target
//! record type), [`FieldSpec`] per-field metadata (display label, required,
//! unique, optional format pattern), and the [`Validator`] that turns one
//! row's raw field values into a typed [`Record`] or a set of attributed
//! failures.
//!
//! ## Responsibilities
//!
//! - JSON schema loading and saving via `serde_json` (`.meta` convention)
//! - Fast-fail configuration checks (duplicate identifiers, bad patterns)
//! - Type coercion, required-field, format, and uniqueness checks
//! - Failure attribution using the field's display label, never the raw
//!   identifier

use std::{collections::HashSet, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    data::{Record, parse_typed_value},
    error::ImportError,
    mapping::FieldValues,
    store::RecordStore,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Guid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field identifier, used as the record attribute key.
    pub name: String,
    /// Human-readable label shown to operators; defaults to the identifier.
    #[serde(default)]
    pub label: Option<String>,
    pub data_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    /// Optional regex the raw cell must match before coercion.
    #[serde(default)]
    pub pattern: Option<String>,
}

impl FieldSpec {
    pub fn new(name: &str, data_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            data_type,
            required: false,
            unique: false,
            pattern: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn labeled(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// The original admin form's "Expected fields: …" help text.
    pub fn expected_fields(&self) -> String {
        self.field_names().collect::<Vec<_>>().join(", ")
    }

    pub fn ensure_valid(&self) -> Result<(), ImportError> {
        if self.fields.is_empty() {
            return Err(ImportError::Configuration(
                "schema declares no fields".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(ImportError::Configuration(
                    "schema contains a field with an empty identifier".to_string(),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ImportError::Configuration(format!(
                    "duplicate field identifier '{}'",
                    field.name
                )));
            }
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating meta file {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing schema JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening meta file {path:?}"))?;
        let reader = BufReader::new(file);
        let schema = serde_json::from_reader(reader).context("Parsing schema JSON")?;
        Ok(schema)
    }
}

/// One validation failure for one row. `label` is `None` for failures that
/// cannot be pinned on a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub label: Option<String>,
    pub message: String,
}

impl Failure {
    pub fn row_level(message: impl Into<String>) -> Self {
        Self {
            label: None,
            message: message.into(),
        }
    }

    pub fn field_level(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum RowValidation {
    Valid(Record),
    Invalid(Vec<Failure>),
}

/// Per-operation validation engine: patterns are compiled once, before any
/// row is read, so a malformed constraint is a configuration error rather
/// than a per-row issue.
#[derive(Debug)]
pub struct Validator<'a> {
    schema: &'a Schema,
    patterns: Vec<Option<Regex>>,
}

impl<'a> Validator<'a> {
    pub fn new(schema: &'a Schema) -> Result<Self, ImportError> {
        schema.ensure_valid()?;
        let mut patterns = Vec::with_capacity(schema.fields.len());
        for field in &schema.fields {
            let compiled = match &field.pattern {
                Some(pattern) => Some(Regex::new(pattern).map_err(|err| {
                    ImportError::Configuration(format!(
                        "invalid pattern for field '{}': {err}",
                        field.name
                    ))
                })?),
                None => None,
            };
            patterns.push(compiled);
        }
        Ok(Self { schema, patterns })
    }

    /// Validates one row's raw values against every schema rule.
    ///
    /// All fields are checked even after the first failure so the operator
    /// sees the complete picture for the row. Uniqueness is probed through
    /// the store, which sees rows staged earlier in the same batch.
    pub fn validate(&self, values: &FieldValues, store: &dyn RecordStore) -> RowValidation {
        let mut failures = Vec::new();
        let mut record = Record::new();

        if values.is_empty() {
            return RowValidation::Invalid(vec![Failure::row_level("Row contains no values")]);
        }

        for (idx, field) in self.schema.fields.iter().enumerate() {
            let raw = values.get(&field.name).unwrap_or("");
            if raw.is_empty() {
                if field.required {
                    failures.push(Failure::field_level(
                        field.display_label(),
                        "This field is required",
                    ));
                }
                continue;
            }
            if let Some(pattern) = &self.patterns[idx] {
                if !pattern.is_match(raw) {
                    failures.push(Failure::field_level(
                        field.display_label(),
                        format!("Value '{raw}' does not match the required format"),
                    ));
                    continue;
                }
            }
            match parse_typed_value(raw, &field.data_type) {
                Ok(Some(value)) => {
                    if field.unique && store.exists(&field.name, &value) {
                        failures.push(Failure::field_level(
                            field.display_label(),
                            format!("Value '{value}' already exists"),
                        ));
                    } else {
                        record.set(field.name.clone(), value);
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    failures.push(Failure::field_level(field.display_label(), err.to_string()));
                }
            }
        }

        if failures.is_empty() {
            RowValidation::Valid(record)
        } else {
            RowValidation::Invalid(failures)
        }
    }
}
