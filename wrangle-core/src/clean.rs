//! Address field cleaning.
//!
//! Street suffixes, states and cities are mapped onto canonical spellings
//! through [`CleaningRules`], an immutable lookup table built once and passed
//! by reference. [`normalize`] never mutates its input; callers store the
//! returned value.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::warn;

/// Address fields covered by the cleaning rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    /// `addr:street`
    Street,
    /// `addr:state`
    State,
    /// `addr:city`
    City,
}

impl AddressField {
    /// Resolve the field cleaned for a full (unsplit) tag key.
    ///
    /// # Examples
    /// ```
    /// use wrangle_core::AddressField;
    ///
    /// assert_eq!(AddressField::from_tag_key("addr:city"), Some(AddressField::City));
    /// assert_eq!(AddressField::from_tag_key("addr:postcode"), None);
    /// ```
    #[must_use]
    pub fn from_tag_key(key: &str) -> Option<Self> {
        match key {
            "addr:street" => Some(Self::Street),
            "addr:state" => Some(Self::State),
            "addr:city" => Some(Self::City),
            _ => None,
        }
    }

    /// The tag key this field is read from.
    #[must_use]
    pub const fn tag_key(self) -> &'static str {
        match self {
            Self::Street => "addr:street",
            Self::State => "addr:state",
            Self::City => "addr:city",
        }
    }
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_key())
    }
}

/// A single canonical value plus the spellings that should map onto it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CanonicalValue {
    /// The expected spelling.
    pub expected: String,
    /// Known variants rewritten to `expected`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub variants: BTreeSet<String>,
}

impl CanonicalValue {
    /// Build a canonical value from its expected spelling and variants.
    pub fn new<I, S>(expected: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            expected: expected.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    fn normalize<'a>(&self, raw: &'a str) -> Normalized<'a> {
        if raw == self.expected {
            Normalized::Expected(raw)
        } else if self.variants.contains(raw) {
            Normalized::Cleaned(self.expected.clone())
        } else {
            Normalized::Unrecognised(raw)
        }
    }
}

/// Lookup tables driving [`normalize`].
///
/// [`CleaningRules::default`] carries the tables built from auditing the Las
/// Vegas extract.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CleaningRules {
    /// Street suffixes accepted as-is.
    pub street_types: BTreeSet<String>,
    /// Street suffix synonyms keyed by the raw token (period included).
    pub street_synonyms: BTreeMap<String, String>,
    /// Canonical state.
    pub state: CanonicalValue,
    /// Canonical city.
    pub city: CanonicalValue,
}

impl Default for CleaningRules {
    fn default() -> Self {
        let street_types = [
            "Street",
            "Avenue",
            "Boulevard",
            "Drive",
            "Court",
            "Place",
            "Square",
            "Lane",
            "Road",
            "Trail",
            "Parkway",
            "Commons",
        ];
        let street_synonyms = [
            ("Rd", "Road"),
            ("Rd.", "Road"),
            ("Ste", "Suite"),
            ("AVE", "Avenue"),
            ("Ave", "Avenue"),
            ("Ave.", "Avenue"),
            ("ave", "Avenue"),
            ("Blvd", "Boulevard"),
            ("Blvd.", "Boulevard"),
            ("blvd", "Boulevard"),
            ("Cir", "Circle"),
            ("Dr", "Drive"),
            ("drive", "Drive"),
            ("Ln", "Lane"),
            ("Ln.", "Lane"),
            ("ln", "Lane"),
            ("Mt.", "Mountain"),
            ("Pkwy", "Parkway"),
            ("parkway", "Parkway"),
            ("N.", "North"),
            ("S.", "South"),
            ("W.", "West"),
            ("E.", "East"),
            ("St", "Street"),
            ("St.", "Street"),
            ("rainbow", "Rainbow"),
        ];
        Self {
            street_types: street_types.into_iter().map(str::to_owned).collect(),
            street_synonyms: street_synonyms
                .into_iter()
                .map(|(raw, canonical)| (raw.to_owned(), canonical.to_owned()))
                .collect(),
            state: CanonicalValue::new("NV", ["nv", "Nevada"]),
            city: CanonicalValue::new(
                "Las Vegas",
                [
                    "Las Vegas NV",
                    "Las vegas",
                    "Las Vegas, NV",
                    "las vegas",
                    "Las Vagas",
                    "LAS VEGAS",
                ],
            ),
        }
    }
}

impl CleaningRules {
    /// Whether a street suffix token is already canonical. A single trailing
    /// period is ignored.
    #[must_use]
    pub fn is_expected_street_type(&self, token: &str) -> bool {
        self.street_types.contains(token)
            || token
                .strip_suffix('.')
                .is_some_and(|bare| self.street_types.contains(bare))
    }

    /// Load rules from a JSON document.
    ///
    /// # Examples
    /// ```
    /// use wrangle_core::CleaningRules;
    ///
    /// let json = r#"{
    ///     "street_types": ["Street"],
    ///     "street_synonyms": {"St": "Street"},
    ///     "state": {"expected": "AZ", "variants": ["az"]},
    ///     "city": {"expected": "Phoenix"}
    /// }"#;
    /// let rules = CleaningRules::from_json_reader(json.as_bytes())?;
    /// assert_eq!(rules.state.expected, "AZ");
    /// assert!(rules.city.variants.is_empty());
    /// # Ok::<(), wrangle_core::RulesError>(())
    /// ```
    #[cfg(feature = "serde")]
    pub fn from_json_reader<R: std::io::Read>(reader: R) -> Result<Self, RulesError> {
        serde_json::from_reader(reader).map_err(|source| RulesError::Parse { source })
    }
}

/// Errors raised when loading [`CleaningRules`].
#[cfg(feature = "serde")]
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    /// The rules document was not valid JSON or did not match the layout.
    #[error("failed to parse cleaning rules")]
    Parse {
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
}

/// Result of cleaning a single value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized<'a> {
    /// The value was already canonical.
    Expected(&'a str),
    /// The value was rewritten.
    Cleaned(String),
    /// No rule covers the value; it passes through for manual review.
    Unrecognised(&'a str),
}

impl Normalized<'_> {
    /// The value to store.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Expected(value) | Self::Unrecognised(value) => value,
            Self::Cleaned(value) => value,
        }
    }

    /// Consume the outcome, returning the value to store.
    #[must_use]
    pub fn into_value(self) -> String {
        match self {
            Self::Expected(value) | Self::Unrecognised(value) => value.to_owned(),
            Self::Cleaned(value) => value,
        }
    }

    /// Whether a rule rewrote the value.
    #[must_use]
    pub const fn is_cleaned(&self) -> bool {
        matches!(self, Self::Cleaned(_))
    }
}

/// Clean one address value.
///
/// Unrecognised values are returned unchanged and logged at `warn` level.
///
/// # Examples
/// ```
/// use wrangle_core::{AddressField, CleaningRules, normalize};
///
/// let rules = CleaningRules::default();
/// let street = normalize(AddressField::Street, "123 Main St", &rules);
/// assert_eq!(street.as_str(), "123 Main Street");
///
/// let state = normalize(AddressField::State, "nv", &rules);
/// assert_eq!(state.into_value(), "NV");
/// ```
#[must_use]
pub fn normalize<'a>(field: AddressField, raw: &'a str, rules: &CleaningRules) -> Normalized<'a> {
    let outcome = match field {
        AddressField::Street => normalize_street(raw, rules),
        AddressField::State => rules.state.normalize(raw),
        AddressField::City => rules.city.normalize(raw),
    };
    if let Normalized::Unrecognised(value) = outcome {
        warn!("no cleaning rule for {field} value {value:?}");
    }
    outcome
}

/// The final whitespace-delimited token of a street name.
///
/// # Examples
/// ```
/// use wrangle_core::street_suffix;
///
/// assert_eq!(street_suffix("South Las Vegas Blvd."), Some("Blvd."));
/// assert_eq!(street_suffix("   "), None);
/// ```
#[must_use]
pub fn street_suffix(raw: &str) -> Option<&str> {
    raw.split_whitespace().next_back()
}

fn normalize_street<'a>(raw: &'a str, rules: &CleaningRules) -> Normalized<'a> {
    let Some(token) = street_suffix(raw) else {
        return Normalized::Unrecognised(raw);
    };
    if rules.is_expected_street_type(token) {
        return Normalized::Expected(raw);
    }

    let canonical = rules.street_synonyms.get(token).or_else(|| {
        token
            .strip_suffix('.')
            .and_then(|bare| rules.street_synonyms.get(bare))
    });
    match canonical {
        Some(canonical) => {
            // The suffix is the last token, so it ends where the trimmed value ends.
            let (body, tail) = raw.split_at(raw.trim_end().len());
            let (head, _) = body.split_at(body.len() - token.len());
            Normalized::Cleaned(format!("{head}{canonical}{tail}"))
        }
        None => Normalized::Unrecognised(raw),
    }
}
