//! Flat records destined for the relational sinks.
//!
//! Column order is fixed and matches the downstream table definitions.

use std::borrow::Cow;
use std::fmt;

use crate::SourceElement;

/// Columns of the `nodes` table.
pub const NODE_FIELDS: &[&str] = &[
    "id",
    "lat",
    "lon",
    "user",
    "uid",
    "version",
    "changeset",
    "timestamp",
];
/// Columns of the `ways` table.
pub const WAY_FIELDS: &[&str] = &["id", "user", "uid", "version", "changeset", "timestamp"];
/// Columns of the `nodes_tags` and `ways_tags` tables.
pub const TAG_FIELDS: &[&str] = &["id", "key", "value", "type"];
/// Columns of the `ways_nodes` table.
pub const WAY_NODE_FIELDS: &[&str] = &["id", "node_id", "position"];

/// Tag type used for keys without a namespace.
pub const REGULAR_TAG_TYPE: &str = "regular";

/// The five record kinds, one per output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    /// `nodes`
    Node,
    /// `nodes_tags`
    NodeTag,
    /// `ways`
    Way,
    /// `ways_tags`
    WayTag,
    /// `ways_nodes`
    WayNode,
}

impl RecordKind {
    /// All kinds, in sink order.
    pub const ALL: [Self; 5] = [
        Self::Node,
        Self::NodeTag,
        Self::Way,
        Self::WayTag,
        Self::WayNode,
    ];

    /// Table (and CSV file stem) name.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Node => "nodes",
            Self::NodeTag => "nodes_tags",
            Self::Way => "ways",
            Self::WayTag => "ways_tags",
            Self::WayNode => "ways_nodes",
        }
    }

    /// Column names in output order.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Node => NODE_FIELDS,
            Self::Way => WAY_FIELDS,
            Self::NodeTag | Self::WayTag => TAG_FIELDS,
            Self::WayNode => WAY_NODE_FIELDS,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Field access shared by the validator and the sinks.
pub trait Record {
    /// Value of a named column, or `None` when absent.
    fn value(&self, column: &str) -> Option<Cow<'_, str>>;

    /// Values for `columns`, with absent fields rendered empty.
    fn row<'a>(&'a self, columns: &[&str]) -> Vec<Cow<'a, str>> {
        columns
            .iter()
            .map(|column| self.value(column).unwrap_or(Cow::Borrowed("")))
            .collect()
    }
}

/// The allow-listed attributes of a node or way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRecord {
    columns: &'static [&'static str],
    values: Vec<Option<String>>,
}

impl AttributeRecord {
    /// Copy the attributes named in `columns` from `element`.
    ///
    /// # Examples
    /// ```
    /// use wrangle_core::{AttributeRecord, ElementKind, Record, SourceElement, WAY_FIELDS};
    ///
    /// let way = SourceElement::new(ElementKind::Way)
    ///     .with_attribute("id", "7")
    ///     .with_attribute("visible", "true");
    /// let record = AttributeRecord::from_element(WAY_FIELDS, &way);
    ///
    /// assert_eq!(record.get("id"), Some("7"));
    /// assert_eq!(record.get("visible"), None);
    /// assert_eq!(record.row(WAY_FIELDS)[1], "");
    /// ```
    #[must_use]
    pub fn from_element(columns: &'static [&'static str], element: &SourceElement) -> Self {
        let values = columns
            .iter()
            .map(|column| element.attribute(column).map(str::to_owned))
            .collect();
        Self { columns, values }
    }

    /// Borrow one attribute.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|candidate| *candidate == column)
            .and_then(|index| self.values.get(index))
            .and_then(Option::as_deref)
    }

    /// The allow-list this record was built from.
    #[must_use]
    pub const fn columns(&self) -> &'static [&'static str] {
        self.columns
    }
}

impl Record for AttributeRecord {
    fn value(&self, column: &str) -> Option<Cow<'_, str>> {
        self.get(column).map(Cow::Borrowed)
    }
}

/// One `tag` child of a node or way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    /// Owning element id.
    pub id: String,
    /// Key, with the namespace prefix removed when split.
    pub key: String,
    /// Value after cleaning.
    pub value: String,
    /// Namespace prefix, or [`REGULAR_TAG_TYPE`].
    pub tag_type: String,
}

impl Record for TagRecord {
    fn value(&self, column: &str) -> Option<Cow<'_, str>> {
        match column {
            "id" => Some(Cow::Borrowed(&self.id)),
            "key" => Some(Cow::Borrowed(&self.key)),
            "value" => Some(Cow::Borrowed(&self.value)),
            "type" => Some(Cow::Borrowed(&self.tag_type)),
            _ => None,
        }
    }
}

/// One `nd` reference of a way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WayNodeRecord {
    /// Owning way id.
    pub way_id: String,
    /// Referenced node id.
    pub node_id: String,
    /// Zero-based ordinal within the way.
    pub position: usize,
}

impl Record for WayNodeRecord {
    fn value(&self, column: &str) -> Option<Cow<'_, str>> {
        match column {
            "id" => Some(Cow::Borrowed(&self.way_id)),
            "node_id" => Some(Cow::Borrowed(&self.node_id)),
            "position" => Some(Cow::Owned(self.position.to_string())),
            _ => None,
        }
    }
}

/// All records produced from one node or way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapedElement {
    /// A shaped node.
    Node {
        /// The `nodes` row.
        node: AttributeRecord,
        /// The `nodes_tags` rows.
        tags: Vec<TagRecord>,
        /// Tags dropped because their key contained problem characters.
        skipped_tags: usize,
    },
    /// A shaped way.
    Way {
        /// The `ways` row.
        way: AttributeRecord,
        /// The `ways_nodes` rows, in document order.
        way_nodes: Vec<WayNodeRecord>,
        /// The `ways_tags` rows.
        tags: Vec<TagRecord>,
        /// Tags dropped because their key contained problem characters.
        skipped_tags: usize,
    },
}

impl ShapedElement {
    /// The node or way row.
    #[must_use]
    pub const fn attributes(&self) -> &AttributeRecord {
        match self {
            Self::Node { node, .. } => node,
            Self::Way { way, .. } => way,
        }
    }

    /// Tag rows in document order.
    #[must_use]
    pub fn tags(&self) -> &[TagRecord] {
        match self {
            Self::Node { tags, .. } | Self::Way { tags, .. } => tags,
        }
    }

    /// Way node rows; empty for nodes.
    #[must_use]
    pub fn way_nodes(&self) -> &[WayNodeRecord] {
        match self {
            Self::Node { .. } => &[],
            Self::Way { way_nodes, .. } => way_nodes,
        }
    }

    /// Number of tags dropped while shaping.
    #[must_use]
    pub const fn skipped_tags(&self) -> usize {
        match self {
            Self::Node { skipped_tags, .. } | Self::Way { skipped_tags, .. } => *skipped_tags,
        }
    }

    /// Every record paired with its kind, attribute row first.
    pub fn records(&self) -> impl Iterator<Item = (RecordKind, &dyn Record)> {
        let (attribute_kind, tag_kind) = match self {
            Self::Node { .. } => (RecordKind::Node, RecordKind::NodeTag),
            Self::Way { .. } => (RecordKind::Way, RecordKind::WayTag),
        };
        std::iter::once((attribute_kind, self.attributes() as &dyn Record))
            .chain(
                self.way_nodes()
                    .iter()
                    .map(|record| (RecordKind::WayNode, record as &dyn Record)),
            )
            .chain(
                self.tags()
                    .iter()
                    .map(move |record| (tag_kind, record as &dyn Record)),
            )
    }
}
