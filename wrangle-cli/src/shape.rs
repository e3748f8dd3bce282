//! `shape` command: stream an extract into the five CSV tables.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use wrangle_data::{ProcessOptions, ProcessSummary, process_map_to_dir};

use crate::{
    ARG_OSM, ARG_OUTPUT_DIR, ARG_RULES, ARG_VALIDATE, CliError, ENV_SHAPE_OSM,
    ENV_SHAPE_OUTPUT_DIR, load_rules, require_existing, write_json,
};

/// CLI arguments for the `shape` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "shape",
    long_about = "Stream an OSM XML extract into nodes.csv, nodes_tags.csv, \
                 ways.csv, ways_tags.csv and ways_nodes.csv, cleaning \
                 address tags on the way. Paths can come from CLI flags, \
                 configuration files, or environment variables.",
    about = "Shape an OSM extract into CSV tables"
)]
#[ortho_config(prefix = "WRANGLE")]
pub(crate) struct ShapeArgs {
    /// Path to the OSM XML extract.
    #[arg(long = ARG_OSM, value_name = "path")]
    #[serde(default)]
    pub(crate) osm: Option<Utf8PathBuf>,
    /// Directory that receives the CSV tables.
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Check every shaped element against the table schema.
    #[arg(long = ARG_VALIDATE)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) validate: bool,
    /// JSON document overriding the built-in cleaning tables.
    #[arg(long = ARG_RULES, value_name = "path")]
    #[serde(default)]
    pub(crate) rules: Option<Utf8PathBuf>,
}

impl ShapeArgs {
    pub(crate) fn into_config(self) -> Result<ShapeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ShapeConfig::try_from(merged)
    }
}

/// Resolved `shape` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ShapeConfig {
    pub(crate) osm: Utf8PathBuf,
    pub(crate) output_dir: Utf8PathBuf,
    pub(crate) validate: bool,
    pub(crate) rules: Option<Utf8PathBuf>,
}

impl ShapeConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.osm, ARG_OSM)?;
        if let Some(rules) = &self.rules {
            require_existing(rules, ARG_RULES)?;
        }
        Ok(())
    }
}

impl TryFrom<ShapeArgs> for ShapeConfig {
    type Error = CliError;

    fn try_from(args: ShapeArgs) -> Result<Self, Self::Error> {
        let osm = args.osm.ok_or(CliError::MissingArgument {
            field: ARG_OSM,
            env: ENV_SHAPE_OSM,
        })?;
        let output_dir = args.output_dir.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT_DIR,
            env: ENV_SHAPE_OUTPUT_DIR,
        })?;
        Ok(Self {
            osm,
            output_dir,
            validate: args.validate,
            rules: args.rules,
        })
    }
}

pub(crate) fn run_shape_with(args: ShapeArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let summary = execute_shape(&config)?;
    write_json(writer, &summary)
}

pub(crate) fn execute_shape(config: &ShapeConfig) -> Result<ProcessSummary, CliError> {
    config.validate_sources()?;
    let options = ProcessOptions::default()
        .with_rules(load_rules(config.rules.as_deref())?)
        .with_validation(config.validate);
    let summary = process_map_to_dir(&config.osm, &config.output_dir, &options)?;
    if summary.dropped_tags > 0 {
        info!("dropped {} tags with problem characters", summary.dropped_tags);
    }
    Ok(summary)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ShapeConfig, CliError> {
    let merged = ShapeArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ShapeConfig::try_from(merged)
}
