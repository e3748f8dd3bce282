//! Command-line interface for wrangling OSM XML extracts.
#![forbid(unsafe_code)]

use std::io::{BufReader, Write};

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use serde::Serialize;
use wrangle_core::CleaningRules;

mod audit;
mod error;
mod load;
mod report;
mod shape;

pub use error::CliError;

use audit::{AuditArgs, run_audit_with};
use load::{LoadArgs, run_load_with};
use report::{ReportArgs, run_report_with};
use shape::{ShapeArgs, run_shape_with};

pub(crate) const ARG_OSM: &str = "osm";
pub(crate) const ARG_OUTPUT_DIR: &str = "output-dir";
pub(crate) const ARG_VALIDATE: &str = "validate";
pub(crate) const ARG_RULES: &str = "rules";
pub(crate) const ARG_CSV_DIR: &str = "csv-dir";
pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ENV_SHAPE_OSM: &str = "WRANGLE_CMDS_SHAPE_OSM";
pub(crate) const ENV_SHAPE_OUTPUT_DIR: &str = "WRANGLE_CMDS_SHAPE_OUTPUT_DIR";
pub(crate) const ENV_AUDIT_OSM: &str = "WRANGLE_CMDS_AUDIT_OSM";
pub(crate) const ENV_LOAD_CSV_DIR: &str = "WRANGLE_CMDS_LOAD_CSV_DIR";
pub(crate) const ENV_LOAD_DATABASE: &str = "WRANGLE_CMDS_LOAD_DATABASE";
pub(crate) const ENV_REPORT_DATABASE: &str = "WRANGLE_CMDS_REPORT_DATABASE";

/// Run the CLI with the current process arguments and environment, writing
/// command output to stdout.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    run_command(cli.command, &mut stdout)
}

fn run_command(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Shape(args) => run_shape_with(args, writer),
        Command::Audit(args) => run_audit_with(args, writer),
        Command::Load(args) => run_load_with(args, writer),
        Command::Report(args) => run_report_with(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "wrangle",
    about = "Audit, clean and load OpenStreetMap XML extracts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Shape an OSM extract into five CSV tables.
    Shape(ShapeArgs),
    /// Survey an OSM extract before settling on cleaning rules.
    Audit(AuditArgs),
    /// Load shaped CSV tables into SQLite.
    Load(LoadArgs),
    /// Print summary statistics for a loaded database.
    Report(ReportArgs),
}

/// Check that `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match wrangle_fs::input_exists(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Cleaning rules from a JSON document, or the built-in Las Vegas tables.
pub(crate) fn load_rules(path: Option<&Utf8Path>) -> Result<CleaningRules, CliError> {
    let Some(path) = path else {
        return Ok(CleaningRules::default());
    };
    let file = wrangle_fs::open_input(path).map_err(|source| CliError::OpenRules {
        path: path.to_path_buf(),
        source,
    })?;
    CleaningRules::from_json_reader(BufReader::new(file)).map_err(|source| {
        CliError::ParseRules {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Write `value` as pretty-printed JSON followed by a newline.
pub(crate) fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
