//! Exploratory audits over an OSM XML extract.
//!
//! A single streaming pass gathers everything needed to decide on cleaning
//! rules: element tallies, contributor ids, key shapes and the address
//! values the current [`CleaningRules`] do not already treat as canonical.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, BufReader};

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use serde::Serialize;
use thiserror::Error;
use wrangle_core::{
    AddressField, CleaningRules, ElementKind, KeyClass, SourceElement, classify_key, normalize,
    street_suffix,
};

use crate::osm_xml::{OsmElements, XmlReadError};

/// Errors raised while auditing an extract.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The OSM input could not be opened.
    #[error("failed to open OSM input at {path}")]
    Open {
        /// Input path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The OSM input is malformed.
    #[error("failed to read OSM input")]
    Read(#[from] XmlReadError),
}

/// Findings of one audit pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Occurrences of every element name, the root included.
    pub element_counts: BTreeMap<String, u64>,
    /// Tag keys per [`KeyClass`] label, across every element.
    pub key_classes: BTreeMap<&'static str, u64>,
    /// Distinct `uid` attributes seen on top-level elements.
    pub unique_users: BTreeSet<String>,
    /// Street names grouped by a suffix that is not an expected street type.
    pub unexpected_street_types: BTreeMap<String, BTreeSet<String>>,
    /// Unexpected street names the current synonym table would rewrite,
    /// mapped to the cleaned form.
    pub street_cleaning_preview: BTreeMap<String, String>,
    /// `addr:state` values other than the expected state.
    pub unexpected_states: BTreeSet<String>,
    /// `addr:city` values other than the expected city.
    pub unexpected_cities: BTreeSet<String>,
}

impl AuditReport {
    fn empty() -> Self {
        Self {
            key_classes: KeyClass::ALL
                .iter()
                .map(|class| (class.as_str(), 0))
                .collect(),
            ..Self::default()
        }
    }

    fn observe(&mut self, element: &SourceElement, rules: &CleaningRules) {
        if let Some(uid) = element.attribute("uid") {
            self.unique_users.insert(uid.to_owned());
        }
        let addresses = matches!(element.kind(), ElementKind::Node | ElementKind::Way);
        for (key, value) in element.tags() {
            *self
                .key_classes
                .entry(classify_key(key).as_str())
                .or_default() += 1;
            if addresses && let Some(field) = AddressField::from_tag_key(key) {
                self.observe_address(field, value, rules);
            }
        }
    }

    fn observe_address(&mut self, field: AddressField, value: &str, rules: &CleaningRules) {
        match field {
            AddressField::Street => {
                if let Some(suffix) = street_suffix(value)
                    && !rules.is_expected_street_type(suffix)
                {
                    self.unexpected_street_types
                        .entry(suffix.to_owned())
                        .or_default()
                        .insert(value.to_owned());
                    let cleaned = normalize(field, value, rules);
                    if cleaned.is_cleaned() {
                        self.street_cleaning_preview
                            .insert(value.to_owned(), cleaned.into_value());
                    }
                }
            }
            AddressField::State => {
                if value != rules.state.expected {
                    self.unexpected_states.insert(value.to_owned());
                }
            }
            AddressField::City => {
                if value != rules.city.expected {
                    self.unexpected_cities.insert(value.to_owned());
                }
            }
        }
    }

    /// Number of distinct contributors.
    #[must_use]
    pub fn unique_user_count(&self) -> usize {
        self.unique_users.len()
    }
}

/// Audit an extract read from `source`.
///
/// Key classes are tallied for tags on every top-level element; address
/// audits only look at nodes and ways.
///
/// # Examples
/// ```
/// use wrangle_core::CleaningRules;
/// use wrangle_data::audit_map;
///
/// let xml = r#"<osm>
///   <node id="1" uid="7"><tag k="addr:street" v="Main St"/></node>
///   <way id="2" uid="8"><tag k="addr:city" v="LAS VEGAS"/></way>
/// </osm>"#;
/// let report = audit_map(xml.as_bytes(), &CleaningRules::default())?;
///
/// assert_eq!(report.unique_user_count(), 2);
/// assert!(report.unexpected_street_types["St"].contains("Main St"));
/// assert!(report.unexpected_cities.contains("LAS VEGAS"));
/// assert_eq!(report.key_classes["lower_colon"], 2);
/// # Ok::<(), wrangle_data::AuditError>(())
/// ```
pub fn audit_map<R: BufRead>(source: R, rules: &CleaningRules) -> Result<AuditReport, AuditError> {
    let mut report = AuditReport::empty();
    let mut elements = OsmElements::new(source);
    for element in elements.by_ref() {
        report.observe(&element?, rules);
    }
    report.element_counts = elements.element_counts().clone();
    Ok(report)
}

/// Audit the OSM file at `path`.
pub fn audit_file(path: &Utf8Path, rules: &CleaningRules) -> Result<AuditReport, AuditError> {
    let file = wrangle_fs::open_input(path).map_err(|source| AuditError::Open {
        path: path.to_owned(),
        source,
    })?;
    info!("auditing {path}");
    audit_map(BufReader::new(file), rules)
}
