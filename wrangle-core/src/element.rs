//! Transient, owned view of one element from an OSM XML document.
//!
//! The streaming reader in `wrangle-data` materialises one top-level element
//! (with its children) at a time and drops it once the shaper is done, so
//! these values never outlive a single pipeline step.

use std::collections::BTreeMap;
use std::fmt;

/// Element names the pipeline recognises.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A point feature.
    Node,
    /// An ordered list of node references.
    Way,
    /// A grouping of other elements. Never shaped.
    Relation,
    /// A `k`/`v` annotation on its parent.
    Tag,
    /// A node reference inside a way.
    Nd,
    /// A relation member.
    Member,
    /// Anything else (`osm`, `bounds`, ...), kept by name.
    Other(String),
}

impl ElementKind {
    /// Map an XML element name onto a kind.
    ///
    /// # Examples
    /// ```
    /// use wrangle_core::ElementKind;
    ///
    /// assert_eq!(ElementKind::from_name("way"), ElementKind::Way);
    /// assert_eq!(ElementKind::from_name("bounds"), ElementKind::Other("bounds".into()));
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "node" => Self::Node,
            "way" => Self::Way,
            "relation" => Self::Relation,
            "tag" => Self::Tag,
            "nd" => Self::Nd,
            "member" => Self::Member,
            other => Self::Other(other.to_owned()),
        }
    }

    /// The XML element name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
            Self::Tag => "tag",
            Self::Nd => "nd",
            Self::Member => "member",
            Self::Other(name) => name,
        }
    }

    /// Whether the kind is a top-level OSM entity (node, way or relation).
    #[must_use]
    pub const fn is_entity(&self) -> bool {
        matches!(self, Self::Node | Self::Way | Self::Relation)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element with its attributes and ordered children.
///
/// # Examples
/// ```
/// use wrangle_core::{ElementKind, SourceElement};
///
/// let node = SourceElement::new(ElementKind::Node)
///     .with_attribute("id", "100")
///     .with_child(
///         SourceElement::new(ElementKind::Tag)
///             .with_attribute("k", "amenity")
///             .with_attribute("v", "cafe"),
///     );
///
/// assert_eq!(node.attribute("id"), Some("100"));
/// assert_eq!(node.tags().collect::<Vec<_>>(), vec![("amenity", "cafe")]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceElement {
    kind: ElementKind,
    attributes: BTreeMap<String, String>,
    children: Vec<SourceElement>,
}

impl SourceElement {
    /// Create an element without attributes or children.
    #[must_use]
    pub const fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder-style child appender.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.push_child(child);
        self
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Append a child in document order.
    pub fn push_child(&mut self, child: Self) {
        self.children.push(child);
    }

    /// The element kind.
    #[must_use]
    pub const fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// Look up a single attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// All attributes, ordered by name.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Children in document order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// `(k, v)` pairs of the child `tag` elements, in document order.
    ///
    /// Tags missing either attribute are skipped.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.children
            .iter()
            .filter(|child| child.kind == ElementKind::Tag)
            .filter_map(|tag| Some((tag.attribute("k")?, tag.attribute("v")?)))
    }
}
