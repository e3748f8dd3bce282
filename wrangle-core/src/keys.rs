//! Tag key patterns shared by the auditor and the shaper.
//!
//! Keys fall into four buckets, checked in priority order:
//! - `lower`: only lowercase letters and underscores;
//! - `lower_colon`: two such runs joined by a single colon;
//! - `problemchars`: contains a character that is unsafe in a column value;
//! - `other`: anything else.

use std::fmt;
use std::sync::LazyLock;

use log::warn;
use regex::Regex;

static LOWER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[a-z_]*$").ok());
static LOWER_COLON: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z_]*:[a-z_]*$").ok());
static NAMESPACED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z_]+:[a-z_]+").ok());
static PROBLEM_CHARS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"[=+/&<>;'"?%#$@,. \t\r\n]"#).ok());

// The patterns are literals; `patterns_compile` below guards against typos.
fn matches(pattern: &LazyLock<Option<Regex>>, key: &str) -> bool {
    pattern.iter().any(|regex| regex.is_match(key))
}

/// Bucket a tag key falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyClass {
    /// `^[a-z_]*$`
    Lower,
    /// `^[a-z_]*:[a-z_]*$`
    LowerColon,
    /// Contains a problem character.
    ProblemChars,
    /// None of the above.
    Other,
}

impl KeyClass {
    /// All classes in priority order.
    pub const ALL: [Self; 4] = [
        Self::Lower,
        Self::LowerColon,
        Self::ProblemChars,
        Self::Other,
    ];

    /// Label used in audit output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lower => "lower",
            Self::LowerColon => "lower_colon",
            Self::ProblemChars => "problemchars",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for KeyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a tag key. Unanticipated shapes are logged.
///
/// # Examples
/// ```
/// use wrangle_core::{KeyClass, classify_key};
///
/// assert_eq!(classify_key("amenity"), KeyClass::Lower);
/// assert_eq!(classify_key("addr:street"), KeyClass::LowerColon);
/// assert_eq!(classify_key("name, en"), KeyClass::ProblemChars);
/// assert_eq!(classify_key("FIXME"), KeyClass::Other);
/// ```
#[must_use]
pub fn classify_key(key: &str) -> KeyClass {
    if matches(&LOWER, key) {
        KeyClass::Lower
    } else if matches(&LOWER_COLON, key) {
        KeyClass::LowerColon
    } else if has_problem_chars(key) {
        KeyClass::ProblemChars
    } else {
        warn!("unexpected tag key shape: {key:?}");
        KeyClass::Other
    }
}

/// Whether the key contains any problem character.
#[must_use]
pub fn has_problem_chars(key: &str) -> bool {
    matches(&PROBLEM_CHARS, key)
}

/// Split a namespaced lowercase key at its first colon.
///
/// Returns `(prefix, rest)` when the key starts with `[a-z_]+:[a-z_]+`; the
/// remainder may itself contain further colons.
///
/// # Examples
/// ```
/// use wrangle_core::split_namespace;
///
/// assert_eq!(split_namespace("addr:street"), Some(("addr", "street")));
/// assert_eq!(split_namespace("addr:street:extra"), Some(("addr", "street:extra")));
/// assert_eq!(split_namespace("name"), None);
/// assert_eq!(split_namespace("Addr:Street"), None);
/// ```
#[must_use]
pub fn split_namespace(key: &str) -> Option<(&str, &str)> {
    if matches(&NAMESPACED, key) {
        key.split_once(':')
    } else {
        None
    }
}
