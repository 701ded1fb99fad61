pub mod cli;
pub mod data;
pub mod error;
pub mod import;
pub mod io_utils;
pub mod issues;
pub mod mapping;
pub mod rows;
pub mod schema;
pub mod store;
pub mod template;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_batchload", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Import(args) => import::execute(&args),
        Commands::Template(args) => template::execute(&args),
        Commands::Schema(args) => handle_schema(&args),
    }
}

fn handle_schema(args: &cli::SchemaArgs) -> Result<()> {
    let schema = schema::Schema::load(&args.meta)
        .with_context(|| format!("Loading schema from {:?}", args.meta))?;
    println!("Expected fields: {}", schema.expected_fields());
    Ok(())
}
