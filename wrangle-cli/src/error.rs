//! Error types emitted by the wrangle CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use wrangle_core::RulesError;
use wrangle_data::{AuditError, PipelineError, StoreError};

/// Errors emitted by the wrangle CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist on disk or is not a file.
    #[error("{field} path {path:?} does not exist or is not a file")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the cleaning rules document failed.
    #[error("failed to open cleaning rules at {path:?}: {source}")]
    OpenRules {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The cleaning rules document could not be decoded.
    #[error("failed to parse cleaning rules at {path:?}: {source}")]
    ParseRules {
        path: Utf8PathBuf,
        #[source]
        source: RulesError,
    },
    /// Shaping the extract into CSV tables failed.
    #[error("failed to shape OSM extract: {0}")]
    Shape(#[from] PipelineError),
    /// Auditing the extract failed.
    #[error("failed to audit OSM extract: {0}")]
    Audit(#[from] AuditError),
    /// Loading or querying the SQLite database failed.
    #[error("database operation failed: {0}")]
    Store(#[from] StoreError),
    /// Serialising command output failed.
    #[error("failed to serialise command output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write command output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
