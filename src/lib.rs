//! Facade crate for the OSM wrangler.
//!
//! Re-exports the I/O-free domain types from `wrangle-core` and, behind the
//! `data` feature, the streaming pipeline, audits and SQLite store from
//! `wrangle-data`.

#![forbid(unsafe_code)]

pub use wrangle_core::{
    AddressField, CleaningRules, ElementKind, KeyClass, Normalized, RecordKind, Schema,
    ShapedElement, Shaper, SourceElement, ValidationError, classify_key, normalize,
};

#[cfg(feature = "data")]
pub use wrangle_data::{
    AuditReport, CsvSinks, OsmElements, PipelineError, ProcessOptions, ProcessSummary,
    audit_file, audit_map, process_map, process_map_to_dir, store,
};
