use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Bulk-load validated CSV records", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a CSV document against a schema and persist it all-or-nothing
    Import(ImportArgs),
    /// Write a blank single-row CSV template for a schema
    Template(TemplateArgs),
    /// Print the fields a schema expects
    Schema(SchemaArgs),
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Input CSV file to import ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Schema file (.meta) describing the target record type
    #[arg(short, long)]
    pub meta: PathBuf,
    /// Destination file for the committed records
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Treat the first row as data instead of a header row
    #[arg(long = "no-headers")]
    pub no_headers: bool,
    /// Map columns by position onto this comma-separated list of field identifiers
    #[arg(long = "positional", value_delimiter = ',')]
    pub positional: Vec<String>,
    /// Under positional mapping, leave a field at its default when the cell is blank
    #[arg(long = "skip-blank")]
    pub skip_blank: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// Schema file (.meta) describing the target record type
    #[arg(short, long)]
    pub meta: PathBuf,
    /// Destination template file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Schema file (.meta) to describe
    #[arg(short, long)]
    pub meta: PathBuf,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
