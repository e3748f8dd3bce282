//! Conversion of one node or way into its flat records.

use log::debug;

use crate::clean::{AddressField, CleaningRules, normalize};
use crate::element::{ElementKind, SourceElement};
use crate::keys::{has_problem_chars, split_namespace};
use crate::record::{
    AttributeRecord, NODE_FIELDS, REGULAR_TAG_TYPE, ShapedElement, TagRecord, WAY_FIELDS,
    WayNodeRecord,
};

/// Shapes elements using a borrowed set of cleaning rules.
///
/// Shaping is a pure function of the element and the rules.
///
/// # Examples
/// ```
/// use wrangle_core::{CleaningRules, ElementKind, Shaper, SourceElement};
///
/// let rules = CleaningRules::default();
/// let shaper = Shaper::new(&rules);
/// let node = SourceElement::new(ElementKind::Node)
///     .with_attribute("id", "100")
///     .with_child(
///         SourceElement::new(ElementKind::Tag)
///             .with_attribute("k", "addr:street")
///             .with_attribute("v", "123 Main St"),
///     );
///
/// let shaped = shaper.shape(&node).expect("nodes are shaped");
/// let tag = &shaped.tags()[0];
/// assert_eq!(tag.id, "100");
/// assert_eq!(tag.key, "street");
/// assert_eq!(tag.value, "123 Main Street");
/// assert_eq!(tag.tag_type, "addr");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Shaper<'r> {
    rules: &'r CleaningRules,
}

impl<'r> Shaper<'r> {
    /// Create a shaper over the given rules.
    #[must_use]
    pub const fn new(rules: &'r CleaningRules) -> Self {
        Self { rules }
    }

    /// Shape a node or way. Every other kind yields `None`.
    #[must_use]
    pub fn shape(&self, element: &SourceElement) -> Option<ShapedElement> {
        match element.kind() {
            ElementKind::Node => Some(self.shape_node(element)),
            ElementKind::Way => Some(self.shape_way(element)),
            _ => None,
        }
    }

    fn shape_node(&self, element: &SourceElement) -> ShapedElement {
        let node = AttributeRecord::from_element(NODE_FIELDS, element);
        let id = element.attribute("id").unwrap_or_default();
        let mut tags = Vec::new();
        let mut skipped_tags = 0;
        for (key, value) in element.tags() {
            match self.shape_tag(id, key, value) {
                Some(tag) => tags.push(tag),
                None => skipped_tags += 1,
            }
        }
        ShapedElement::Node {
            node,
            tags,
            skipped_tags,
        }
    }

    fn shape_way(&self, element: &SourceElement) -> ShapedElement {
        let way = AttributeRecord::from_element(WAY_FIELDS, element);
        let id = element.attribute("id").unwrap_or_default();
        let mut way_nodes = Vec::new();
        let mut tags = Vec::new();
        let mut skipped_tags = 0;
        for child in element.children() {
            match child.kind() {
                ElementKind::Nd => {
                    let Some(node_id) = child.attribute("ref") else {
                        debug!("way {id}: nd without ref attribute");
                        continue;
                    };
                    way_nodes.push(WayNodeRecord {
                        way_id: id.to_owned(),
                        node_id: node_id.to_owned(),
                        position: way_nodes.len(),
                    });
                }
                ElementKind::Tag => {
                    let (Some(key), Some(value)) = (child.attribute("k"), child.attribute("v"))
                    else {
                        continue;
                    };
                    match self.shape_tag(id, key, value) {
                        Some(tag) => tags.push(tag),
                        None => skipped_tags += 1,
                    }
                }
                _ => {}
            }
        }
        ShapedElement::Way {
            way,
            way_nodes,
            tags,
            skipped_tags,
        }
    }

    fn shape_tag(&self, owner_id: &str, key: &str, value: &str) -> Option<TagRecord> {
        if has_problem_chars(key) {
            debug!("element {owner_id}: dropping tag with problem key {key:?}");
            return None;
        }
        let value = match AddressField::from_tag_key(key) {
            Some(field) => normalize(field, value, self.rules).into_value(),
            None => value.to_owned(),
        };
        let (tag_type, key) = split_namespace(key).unwrap_or((REGULAR_TAG_TYPE, key));
        Some(TagRecord {
            id: owner_id.to_owned(),
            key: key.to_owned(),
            value,
            tag_type: tag_type.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use rstest::{fixture, rstest};

    #[fixture]
    fn rules() -> CleaningRules {
        CleaningRules::default()
    }

    fn tag(key: &str, value: &str) -> SourceElement {
        SourceElement::new(ElementKind::Tag)
            .with_attribute("k", key)
            .with_attribute("v", value)
    }

    fn nd(reference: &str) -> SourceElement {
        SourceElement::new(ElementKind::Nd).with_attribute("ref", reference)
    }

    #[rstest]
    #[case(ElementKind::Relation)]
    #[case(ElementKind::Tag)]
    #[case(ElementKind::Nd)]
    #[case(ElementKind::Other("bounds".into()))]
    fn ignores_non_entities(rules: CleaningRules, #[case] kind: ElementKind) {
        let element = SourceElement::new(kind)
            .with_attribute("id", "1")
            .with_child(tag("name", "x"));
        assert_eq!(Shaper::new(&rules).shape(&element), None);
    }

    #[rstest]
    fn way_nodes_are_numbered_in_document_order(rules: CleaningRules) {
        let way = SourceElement::new(ElementKind::Way)
            .with_attribute("id", "9")
            .with_child(nd("1"))
            .with_child(tag("highway", "service"))
            .with_child(nd("2"))
            .with_child(nd("3"));
        let shaped = Shaper::new(&rules).shape(&way).expect("ways are shaped");
        let refs: Vec<_> = shaped
            .way_nodes()
            .iter()
            .map(|record| (record.way_id.as_str(), record.node_id.as_str(), record.position))
            .collect();
        assert_eq!(refs, [("9", "1", 0), ("9", "2", 1), ("9", "3", 2)]);
        assert_eq!(shaped.tags().len(), 1);
    }

    #[rstest]
    fn attribute_rows_drop_unlisted_attributes(rules: CleaningRules) {
        let node = SourceElement::new(ElementKind::Node)
            .with_attribute("id", "1")
            .with_attribute("lat", "36.1")
            .with_attribute("visible", "true");
        let shaped = Shaper::new(&rules).shape(&node).expect("nodes are shaped");
        assert_eq!(shaped.attributes().get("lat"), Some("36.1"));
        assert_eq!(shaped.attributes().value("visible"), None);
    }

    #[rstest]
    fn way_attribute_rows_have_no_coordinates(rules: CleaningRules) {
        let way = SourceElement::new(ElementKind::Way)
            .with_attribute("id", "1")
            .with_attribute("lat", "36.1");
        let shaped = Shaper::new(&rules).shape(&way).expect("ways are shaped");
        assert_eq!(shaped.attributes().get("lat"), None);
    }

    #[rstest]
    #[case("a,b")]
    #[case("name en")]
    #[case("addr.street")]
    fn problem_keys_are_dropped(rules: CleaningRules, #[case] key: &str) {
        let node = SourceElement::new(ElementKind::Node)
            .with_attribute("id", "1")
            .with_child(tag(key, "x"))
            .with_child(tag("amenity", "cafe"));
        let shaped = Shaper::new(&rules).shape(&node).expect("nodes are shaped");
        assert_eq!(shaped.tags().len(), 1);
        assert_eq!(shaped.skipped_tags(), 1);
    }

    #[rstest]
    #[case("addr:street:extra", "addr", "street:extra")]
    #[case("addr:housenumber", "addr", "housenumber")]
    #[case("name", "regular", "name")]
    #[case("FIXME", "regular", "FIXME")]
    #[case("gnis:County", "regular", "gnis:County")]
    fn splits_namespace_at_first_colon(
        rules: CleaningRules,
        #[case] key: &str,
        #[case] tag_type: &str,
        #[case] short_key: &str,
    ) {
        let node = SourceElement::new(ElementKind::Node)
            .with_attribute("id", "1")
            .with_child(tag(key, "value"));
        let shaped = Shaper::new(&rules).shape(&node).expect("nodes are shaped");
        let record = shaped.tags().first().expect("one tag");
        assert_eq!(record.tag_type, tag_type);
        assert_eq!(record.key, short_key);
    }

    #[rstest]
    fn cleans_each_address_tag_independently(rules: CleaningRules) {
        let way = SourceElement::new(ElementKind::Way)
            .with_attribute("id", "4")
            .with_child(tag("addr:city", "LAS VEGAS"))
            .with_child(tag("addr:city", "Henderson"))
            .with_child(tag("addr:state", "Nevada"));
        let shaped = Shaper::new(&rules).shape(&way).expect("ways are shaped");
        let values: Vec<_> = shaped.tags().iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, ["Las Vegas", "Henderson", "NV"]);
    }

    #[rstest]
    fn leaves_other_values_alone(rules: CleaningRules) {
        let node = SourceElement::new(ElementKind::Node)
            .with_attribute("id", "1")
            .with_child(tag("name", "Main St"));
        let shaped = Shaper::new(&rules).shape(&node).expect("nodes are shaped");
        assert_eq!(shaped.tags()[0].value, "Main St");
    }
}
