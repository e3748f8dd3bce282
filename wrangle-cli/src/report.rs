//! `report` command: summary statistics over a loaded database.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use wrangle_data::store::report_for_path;

use crate::{ARG_DATABASE, CliError, ENV_REPORT_DATABASE, require_existing, write_json};

/// CLI arguments for the `report` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "report", about = "Report statistics for a loaded map database")]
#[ortho_config(prefix = "WRANGLE")]
pub(crate) struct ReportArgs {
    /// SQLite database written by `load`.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

pub(crate) fn run_report_with(args: ReportArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let database = merged.database.ok_or(CliError::MissingArgument {
        field: ARG_DATABASE,
        env: ENV_REPORT_DATABASE,
    })?;
    require_existing(&database, ARG_DATABASE)?;
    let report = report_for_path(&database)?;
    write_json(writer, &report)
}
