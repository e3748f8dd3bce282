//! Typed schema for shaped records and a fail-fast validator.
//!
//! Values are carried as text, as they appear in the source document, so
//! type checks are "does this coerce" checks rather than runtime type tests.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::record::{Record, RecordKind, ShapedElement};

/// Primitive type a field must coerce to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A signed 64-bit integer.
    Integer,
    /// A finite floating point number.
    Float,
    /// Free text.
    Text,
}

impl FieldType {
    fn accepts(self, value: &str) -> bool {
        match self {
            Self::Integer => value.parse::<i64>().is_ok(),
            Self::Float => value.parse::<f64>().is_ok_and(f64::is_finite),
            Self::Text => true,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "string",
        })
    }
}

/// Constraints on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Column name.
    pub name: &'static str,
    /// Type the value must coerce to.
    pub field_type: FieldType,
    /// Whether the value must be present.
    pub required: bool,
    /// Closed set of accepted values, if any.
    pub allowed: Option<&'static [&'static str]>,
}

impl FieldSpec {
    /// A required field of the given type.
    #[must_use]
    pub const fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
            allowed: None,
        }
    }

    /// An optional field of the given type.
    #[must_use]
    pub const fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
            allowed: None,
        }
    }

    /// Restrict the field to an enumerated set of values.
    #[must_use]
    pub const fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    fn check(&self, value: Option<&str>) -> Result<(), ValidationDetail> {
        let Some(value) = value else {
            return if self.required {
                Err(ValidationDetail::Missing)
            } else {
                Ok(())
            };
        };
        if !self.field_type.accepts(value) {
            return Err(ValidationDetail::WrongType {
                expected: self.field_type,
                value: value.to_owned(),
            });
        }
        if let Some(allowed) = self.allowed
            && !allowed.contains(&value)
        {
            return Err(ValidationDetail::NotAllowed {
                value: value.to_owned(),
            });
        }
        Ok(())
    }
}

/// Per-kind field constraints.
///
/// # Examples
/// ```
/// use wrangle_core::{ElementKind, Schema, Shaper, SourceElement, CleaningRules};
///
/// let rules = CleaningRules::default();
/// let shaper = Shaper::new(&rules);
/// let node = SourceElement::new(ElementKind::Node).with_attribute("id", "not-a-number");
/// let shaped = shaper.shape(&node).expect("nodes are shaped");
///
/// let err = Schema::default().validate(&shaped).expect_err("id must be an integer");
/// assert_eq!(err.field, "id");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    records: BTreeMap<RecordKind, Vec<FieldSpec>>,
}

impl Default for Schema {
    fn default() -> Self {
        use FieldType::{Float, Integer, Text};

        let tag = vec![
            FieldSpec::required("id", Integer),
            FieldSpec::required("key", Text),
            FieldSpec::required("value", Text),
            FieldSpec::required("type", Text),
        ];
        Self::empty()
            .with_record(
                RecordKind::Node,
                vec![
                    FieldSpec::required("id", Integer),
                    FieldSpec::required("lat", Float),
                    FieldSpec::required("lon", Float),
                    FieldSpec::required("user", Text),
                    FieldSpec::required("uid", Integer),
                    FieldSpec::required("version", Text),
                    FieldSpec::required("changeset", Integer),
                    FieldSpec::required("timestamp", Text),
                ],
            )
            .with_record(RecordKind::NodeTag, tag.clone())
            .with_record(
                RecordKind::Way,
                vec![
                    FieldSpec::required("id", Integer),
                    FieldSpec::required("user", Text),
                    FieldSpec::required("uid", Integer),
                    FieldSpec::required("version", Text),
                    FieldSpec::required("changeset", Integer),
                    FieldSpec::required("timestamp", Text),
                ],
            )
            .with_record(RecordKind::WayTag, tag)
            .with_record(
                RecordKind::WayNode,
                vec![
                    FieldSpec::required("id", Integer),
                    FieldSpec::required("node_id", Integer),
                    FieldSpec::required("position", Integer),
                ],
            )
    }
}

impl Schema {
    /// A schema with no constraints.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Replace the constraints for one record kind.
    #[must_use]
    pub fn with_record(mut self, kind: RecordKind, fields: Vec<FieldSpec>) -> Self {
        self.records.insert(kind, fields);
        self
    }

    /// Constraints registered for `kind`.
    #[must_use]
    pub fn fields(&self, kind: RecordKind) -> &[FieldSpec] {
        self.records
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Check every record of a shaped element, stopping at the first error.
    pub fn validate(&self, shaped: &ShapedElement) -> Result<(), ValidationError> {
        shaped
            .records()
            .try_for_each(|(kind, record)| self.validate_record(kind, record))
    }

    /// Check a single record.
    pub fn validate_record(
        &self,
        kind: RecordKind,
        record: &dyn Record,
    ) -> Result<(), ValidationError> {
        for spec in self.fields(kind) {
            let value = record.value(spec.name);
            spec.check(value.as_deref()).map_err(|detail| ValidationError {
                record: kind,
                field: spec.name,
                detail,
            })?;
        }
        Ok(())
    }
}

/// Validate `shaped` against `schema`.
pub fn validate(shaped: &ShapedElement, schema: &Schema) -> Result<(), ValidationError> {
    schema.validate(shaped)
}

/// The first schema violation found in a shaped element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{record} record has an invalid `{field}` field: {detail}")]
pub struct ValidationError {
    /// Record kind that failed.
    pub record: RecordKind,
    /// Offending column.
    pub field: &'static str,
    /// What was wrong with it.
    pub detail: ValidationDetail,
}

/// Reason a field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationDetail {
    /// A required value was absent.
    #[error("required field is missing")]
    Missing,
    /// The value did not coerce to the declared type.
    #[error("must be of {expected} type, got {value:?}")]
    WrongType {
        /// Declared type.
        expected: FieldType,
        /// Raw value.
        value: String,
    },
    /// The value is not in the enumerated set.
    #[error("unallowed value {value:?}")]
    NotAllowed {
        /// Raw value.
        value: String,
    },
}
