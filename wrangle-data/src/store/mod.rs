//! SQLite persistence for shaped map tables.
//!
//! - [`schema`] drops and recreates the five tables.
//! - [`load`] bulk-inserts the CSV outputs of the pipeline.
//! - [`report`] runs the summary queries over a loaded database.
#![forbid(unsafe_code)]

mod load;
mod report;
mod schema;

use camino::Utf8PathBuf;
use rusqlite::Error as SqliteError;
use thiserror::Error;
use wrangle_core::RecordKind;

pub use load::{LoadSummary, load_csv_dir, load_csv_dir_to_path};
pub use report::{MapReport, UserContribution, report_for_path, run_report};
pub use schema::recreate_tables;

/// Errors raised while loading or querying the map database.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create the parent directory of {path}")]
    CreateDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open SQLite database at {path}")]
    Open {
        path: Utf8PathBuf,
        #[source]
        source: SqliteError,
    },
    #[error("failed to enable SQLite foreign keys")]
    ForeignKeys {
        #[source]
        source: SqliteError,
    },
    #[error("failed to execute migration step '{step}'")]
    Migration {
        step: &'static str,
        #[source]
        source: SqliteError,
    },
    #[error("failed to open CSV input at {path}")]
    OpenCsv {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read the {table} CSV")]
    Csv {
        table: RecordKind,
        #[source]
        source: csv::Error,
    },
    #[error("unexpected header row in the {table} CSV: {found}")]
    UnexpectedHeader { table: RecordKind, found: String },
    #[error("failed to insert row {row} into {table}")]
    Insert {
        table: RecordKind,
        row: u64,
        #[source]
        source: SqliteError,
    },
    #[error("failed to {operation}")]
    Sqlite {
        operation: &'static str,
        #[source]
        source: SqliteError,
    },
    #[error("failed to run the {query} query")]
    Query {
        query: &'static str,
        #[source]
        source: SqliteError,
    },
}
