//! `audit` command: survey key shapes, contributors and address values.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use wrangle_data::{AuditReport, audit_file};

use crate::{
    ARG_OSM, ARG_RULES, CliError, ENV_AUDIT_OSM, load_rules, require_existing, write_json,
};

/// CLI arguments for the `audit` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "audit",
    long_about = "Report element counts, tag key classes, distinct \
                 contributors and the street types, states and cities the \
                 cleaning rules do not yet treat as canonical.",
    about = "Audit an OSM extract"
)]
#[ortho_config(prefix = "WRANGLE")]
pub(crate) struct AuditArgs {
    /// Path to the OSM XML extract.
    #[arg(long = ARG_OSM, value_name = "path")]
    #[serde(default)]
    pub(crate) osm: Option<Utf8PathBuf>,
    /// JSON document overriding the built-in cleaning tables.
    #[arg(long = ARG_RULES, value_name = "path")]
    #[serde(default)]
    pub(crate) rules: Option<Utf8PathBuf>,
}

/// Resolved `audit` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuditConfig {
    pub(crate) osm: Utf8PathBuf,
    pub(crate) rules: Option<Utf8PathBuf>,
}

impl TryFrom<AuditArgs> for AuditConfig {
    type Error = CliError;

    fn try_from(args: AuditArgs) -> Result<Self, Self::Error> {
        let osm = args.osm.ok_or(CliError::MissingArgument {
            field: ARG_OSM,
            env: ENV_AUDIT_OSM,
        })?;
        Ok(Self {
            osm,
            rules: args.rules,
        })
    }
}

pub(crate) fn run_audit_with(args: AuditArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let report = execute_audit(&AuditConfig::try_from(merged)?)?;
    write_json(writer, &report)
}

pub(crate) fn execute_audit(config: &AuditConfig) -> Result<AuditReport, CliError> {
    require_existing(&config.osm, ARG_OSM)?;
    if let Some(rules) = &config.rules {
        require_existing(rules, ARG_RULES)?;
    }
    let rules = load_rules(config.rules.as_deref())?;
    Ok(audit_file(&config.osm, &rules)?)
}
