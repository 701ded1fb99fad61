//! The batch transaction controller: reader → mapper → validator pipeline
//! inside one all-or-nothing unit of work.
//!
//! The controller walks a three-state machine. It starts **Open**, attempts
//! every data row in order (a row failure never stops the batch, so the
//! operator sees every problem from a single submission), and finishes
//! **Committed** only when the issue log is empty. Any recorded issue —
//! including a document-level structural failure, which does stop row
//! processing immediately — drives the batch to **Aborted** and discards
//! every staged write, no matter how many rows individually validated.

use std::io::Read;

use anyhow::{Result, bail};
use log::{debug, info, warn};

use crate::{
    cli::ImportArgs,
    error::ImportError,
    io_utils::{self, Dialect},
    issues::{ImportIssue, IssueLog},
    mapping::FieldMapping,
    rows::RowReader,
    schema::{RowValidation, Schema, Validator},
    store::{CsvStore, RecordStore},
};

/// Everything one import operation needs, constructed once and consumed once.
pub struct ImportRequest {
    pub input: Box<dyn Read>,
    pub has_headers: bool,
    pub dialect: Dialect,
    pub schema: Schema,
    pub mapping: FieldMapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Open,
    Committed,
    Aborted,
}

#[derive(Debug)]
pub enum ImportOutcome {
    /// Every row validated; all records are durable.
    Committed { rows_imported: usize },
    /// At least one issue was recorded; zero records persisted.
    Aborted { issues: Vec<ImportIssue> },
}

impl ImportOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, ImportOutcome::Committed { .. })
    }

    pub fn issues(&self) -> &[ImportIssue] {
        match self {
            ImportOutcome::Committed { .. } => &[],
            ImportOutcome::Aborted { issues } => issues,
        }
    }
}

/// Runs one import operation to completion.
///
/// Configuration defects (bad mapping entry, malformed schema constraint)
/// surface as [`ImportError::Configuration`] before any row is read; they
/// are a setup problem, not operator-correctable data, and never travel
/// through the issue channel.
pub fn run(request: ImportRequest, store: &mut dyn RecordStore) -> Result<ImportOutcome> {
    request.mapping.ensure_valid(&request.schema)?;
    let validator = Validator::new(&request.schema)?;

    let mut state = BatchState::Open;
    let mut log = IssueLog::new();
    let mut rows_attempted = 0usize;
    debug!("Batch {state:?}, reading rows");

    let reader = RowReader::new(request.input, &request.dialect, request.has_headers);
    for row in reader {
        match row {
            Ok(row) => {
                rows_attempted += 1;
                match request.mapping.apply(&request.schema, &row) {
                    Ok(values) => match validator.validate(&values, store) {
                        RowValidation::Valid(record) => store.stage(record)?,
                        RowValidation::Invalid(failures) => {
                            for failure in failures {
                                match failure.label {
                                    Some(label) => log.record(ImportIssue::field(
                                        row.number,
                                        label,
                                        failure.message,
                                    )),
                                    None => {
                                        log.record(ImportIssue::row(row.number, failure.message))
                                    }
                                }
                            }
                        }
                    },
                    Err(message) => log.record(ImportIssue::row(row.number, message)),
                }
            }
            Err(err @ ImportError::Structural(_)) => {
                // The document itself is unusable past this point; the
                // reader has already fused.
                log.record(ImportIssue::document(err.to_string()));
            }
            Err(err) => return Err(err.into()),
        }
    }

    if log.has_issues() {
        store.abort();
        state = BatchState::Aborted;
        debug!(
            "Batch {state:?} after {rows_attempted} row(s), {} issue(s)",
            log.len()
        );
        return Ok(ImportOutcome::Aborted {
            issues: log.into_issues(),
        });
    }

    let rows_imported = store.commit()?;
    state = BatchState::Committed;
    debug!("Batch {state:?}, {rows_imported} row(s) imported");
    Ok(ImportOutcome::Committed { rows_imported })
}

pub fn execute(args: &ImportArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let dialect = Dialect::with_delimiter(delimiter).with_encoding(encoding);

    let schema = Schema::load(&args.meta)?;
    let mapping = if args.positional.is_empty() {
        FieldMapping::keyed()
    } else {
        FieldMapping::positional_fields(&args.positional, args.skip_blank)
    };

    info!(
        "Importing '{}' against schema {:?} ({} field(s))",
        args.input.display(),
        args.meta,
        schema.fields.len()
    );

    let request = ImportRequest {
        input: io_utils::open_input(&args.input)?,
        has_headers: !args.no_headers,
        dialect,
        schema: schema.clone(),
        mapping,
    };
    let output_delimiter =
        io_utils::resolve_output_delimiter(Some(&args.output), args.delimiter, delimiter);
    let mut store = CsvStore::new(
        schema,
        &args.output,
        Dialect::with_delimiter(output_delimiter),
    );

    match run(request, &mut store)? {
        ImportOutcome::Committed { rows_imported } => {
            info!(
                "Imported {rows_imported} row(s) into {:?}",
                args.output
            );
            Ok(())
        }
        ImportOutcome::Aborted { issues } => {
            for issue in &issues {
                warn!("Could not import: {issue}");
            }
            bail!(
                "import aborted with {} issue(s); no records were written",
                issues.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use crate::mapping::MappingEntry;
    use crate::schema::{FieldSpec, FieldType};
    use crate::store::MemoryStore;
    use std::io::Cursor;

    fn contact_schema() -> Schema {
        Schema::new(vec![
            FieldSpec::new("name", FieldType::String)
                .required()
                .labeled("Name"),
            FieldSpec::new("email", FieldType::String).labeled("Email"),
        ])
    }

    fn request(input: &str, has_headers: bool, schema: Schema, mapping: FieldMapping) -> ImportRequest {
        ImportRequest {
            input: Box::new(Cursor::new(input.to_string())),
            has_headers,
            dialect: Dialect::default(),
            schema,
            mapping,
        }
    }

    #[test]
    fn all_valid_rows_commit_completely() {
        let mut store = MemoryStore::new();
        let outcome = run(
            request(
                "Alice,a@x.com\nBob,b@x.com\n",
                false,
                contact_schema(),
                FieldMapping::keyed(),
            ),
            &mut store,
        )
        .expect("run");

        assert!(outcome.is_committed());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn one_bad_row_aborts_the_whole_batch() {
        let mut store = MemoryStore::new();
        let outcome = run(
            request(
                "Alice,a@x.com\n,b@x.com\n",
                false,
                contact_schema(),
                FieldMapping::keyed(),
            ),
            &mut store,
        )
        .expect("run");

        assert!(!outcome.is_committed());
        assert_eq!(store.len(), 0);
        let issues = outcome.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0],
            ImportIssue::field(2, "Name", "This field is required")
        );
    }

    #[test]
    fn header_row_shifts_numbering_so_first_data_row_is_one() {
        let mut store = MemoryStore::new();
        let outcome = run(
            request(
                "name,email\n,b@x.com\n",
                true,
                contact_schema(),
                FieldMapping::keyed(),
            ),
            &mut store,
        )
        .expect("run");

        assert_eq!(outcome.issues()[0].row_number(), Some(1));
    }

    #[test]
    fn every_failing_row_is_reported_in_order() {
        let mut store = MemoryStore::new();
        let outcome = run(
            request(
                ",a@x.com\nBob,b@x.com\n,c@x.com\n",
                false,
                contact_schema(),
                FieldMapping::keyed(),
            ),
            &mut store,
        )
        .expect("run");

        let rows: Vec<_> = outcome.issues().iter().map(|i| i.row_number()).collect();
        assert_eq!(rows, vec![Some(1), Some(3)]);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn configuration_error_fires_before_any_row() {
        let mut store = MemoryStore::new();
        let mapping = FieldMapping::positional(vec![MappingEntry::assign("missing")], false);
        let err = run(
            request("Alice,a@x.com\n", false, contact_schema(), mapping),
            &mut store,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown field 'missing'"));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn transform_failure_is_a_row_level_issue() {
        let schema = contact_schema();
        let mapping = FieldMapping::positional(
            vec![MappingEntry::transform("name_and_email", |values, cell| {
                let (name, email) = cell
                    .split_once(';')
                    .ok_or_else(|| format!("'{cell}' is not name;email"))?;
                values.set("name", name);
                values.set("email", email);
                Ok(())
            })],
            false,
        );
        let mut store = MemoryStore::new();
        let outcome = run(
            request("\"Alice;a@x.com\"\n\"broken\"\n", false, schema, mapping),
            &mut store,
        )
        .expect("run");

        assert_eq!(
            outcome.issues().to_vec(),
            vec![ImportIssue::row(2, "'broken' is not name;email")]
        );
    }

    #[test]
    fn duplicate_unique_values_within_a_batch_collide() {
        let schema = Schema::new(vec![
            FieldSpec::new("email", FieldType::String)
                .required()
                .unique()
                .labeled("Email"),
        ]);
        let mut store = MemoryStore::new();
        let outcome = run(
            request("a@x.com\na@x.com\n", false, schema, FieldMapping::keyed()),
            &mut store,
        )
        .expect("run");

        let issues = outcome.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].row_number(), Some(2));
        assert!(issues[0].message().contains("already exists"));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn committed_records_carry_typed_values() {
        let schema = Schema::new(vec![
            FieldSpec::new("name", FieldType::String).required(),
            FieldSpec::new("age", FieldType::Integer),
        ]);
        let mut store = MemoryStore::new();
        let outcome = run(
            request("Alice,42\n", false, schema, FieldMapping::keyed()),
            &mut store,
        )
        .expect("run");

        assert!(outcome.is_committed());
        assert_eq!(store.records()[0].get("age"), Some(&Value::Integer(42)));
    }
}
