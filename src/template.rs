//! Blank-template export: one header row of display labels, written with the
//! same dialect the importer reads, so a filled template round-trips.

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::TemplateArgs,
    io_utils::{self, Dialect},
    schema::Schema,
};

pub fn execute(args: &TemplateArgs) -> Result<()> {
    let schema = Schema::load(&args.meta)
        .with_context(|| format!("Loading schema from {:?}", args.meta))?;
    let delimiter = io_utils::resolve_output_delimiter(
        args.output.as_deref(),
        args.delimiter,
        io_utils::DEFAULT_CSV_DELIMITER,
    );
    let dialect = Dialect::with_delimiter(delimiter);

    let mut writer = io_utils::open_csv_writer(args.output.as_deref(), &dialect)?;
    writer
        .write_record(template_labels(&schema))
        .context("Writing template header")?;
    writer.flush().context("Flushing template")?;

    if let Some(output) = &args.output {
        info!(
            "Template with {} column(s) written to {:?}",
            schema.fields.len(),
            output
        );
    }
    Ok(())
}

/// Required fields are marked with a trailing `*`, matching the convention
/// operators see in the import error messages' labels.
pub fn template_labels(schema: &Schema) -> Vec<String> {
    schema
        .fields
        .iter()
        .map(|field| {
            if field.required {
                format!("{}*", field.display_label())
            } else {
                field.display_label().to_string()
            }
        })
        .collect()
}
