//! `load` command: bulk-insert shaped CSV tables into SQLite.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use wrangle_data::LoadSummary;
use wrangle_data::store::load_csv_dir_to_path;

use crate::{
    ARG_CSV_DIR, ARG_DATABASE, CliError, ENV_LOAD_CSV_DIR, ENV_LOAD_DATABASE, write_json,
};

/// CLI arguments for the `load` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "load",
    long_about = "Drop and recreate the nodes, nodes_tags, ways, ways_tags \
                 and ways_nodes tables, then fill them from the CSV files \
                 written by `shape`.",
    about = "Load CSV tables into SQLite"
)]
#[ortho_config(prefix = "WRANGLE")]
pub(crate) struct LoadArgs {
    /// Directory holding the CSV tables.
    #[arg(long = ARG_CSV_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) csv_dir: Option<Utf8PathBuf>,
    /// SQLite database to (re)create.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// Resolved `load` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadConfig {
    pub(crate) csv_dir: Utf8PathBuf,
    pub(crate) database: Utf8PathBuf,
}

impl TryFrom<LoadArgs> for LoadConfig {
    type Error = CliError;

    fn try_from(args: LoadArgs) -> Result<Self, Self::Error> {
        let csv_dir = args.csv_dir.ok_or(CliError::MissingArgument {
            field: ARG_CSV_DIR,
            env: ENV_LOAD_CSV_DIR,
        })?;
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_LOAD_DATABASE,
        })?;
        Ok(Self { csv_dir, database })
    }
}

pub(crate) fn run_load_with(args: LoadArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = LoadConfig::try_from(merged)?;
    let summary: LoadSummary = load_csv_dir_to_path(&config.csv_dir, &config.database)?;
    write_json(writer, &summary)
}
