//! I/O side of the OSM wrangler.
//!
//! Responsibilities:
//! - Stream OSM XML one top-level element at a time ([`OsmElements`]).
//! - Drive shaping and validation into the five CSV sinks ([`process_map`]).
//! - Audit raw extracts before cleaning rules are settled ([`audit_map`]).
//! - Load the CSV tables into SQLite and query them ([`store`]).
//!
//! Boundaries:
//! - Cleaning, shaping and schema rules live in `wrangle-core`.
//! - Command-line parsing and configuration live in `wrangle-cli`.
//!
//! Invariants:
//! - Memory stays bounded by the largest single element, not the document.
//! - No global mutable state.

pub mod audit;
pub mod osm_xml;
pub mod pipeline;
pub mod sink;
pub mod store;

pub use audit::{AuditError, AuditReport, audit_file, audit_map};
pub use osm_xml::{OsmElements, XmlReadError};
pub use pipeline::{
    PipelineError, ProcessOptions, ProcessSummary, process_map, process_map_to_dir,
};
pub use sink::{CsvSinks, SinkError, csv_file_name};
pub use store::{LoadSummary, MapReport, StoreError, UserContribution};
