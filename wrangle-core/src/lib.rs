//! Core domain types for wrangling OpenStreetMap XML extracts.
//!
//! The crate is I/O free. It models one parsed element at a time
//! ([`SourceElement`]), classifies tag keys, cleans address values through
//! an immutable [`CleaningRules`] table, shapes nodes and ways into flat
//! records ([`ShapedElement`]) and validates those records against a typed
//! [`Schema`]. Streaming, sinks and persistence live in `wrangle-data`.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod clean;
pub mod element;
pub mod keys;
pub mod record;
pub mod schema;
pub mod shape;

#[cfg(feature = "serde")]
pub use clean::RulesError;
pub use clean::{
    AddressField, CanonicalValue, CleaningRules, Normalized, normalize, street_suffix,
};
pub use element::{ElementKind, SourceElement};
pub use keys::{KeyClass, classify_key, has_problem_chars, split_namespace};
pub use record::{
    AttributeRecord, NODE_FIELDS, REGULAR_TAG_TYPE, Record, RecordKind, ShapedElement,
    TAG_FIELDS, TagRecord, WAY_FIELDS, WAY_NODE_FIELDS, WayNodeRecord,
};
pub use schema::{FieldSpec, FieldType, Schema, ValidationDetail, ValidationError, validate};
pub use shape::Shaper;
