//! Property-based tests for the element shaper.
//!
//! # Invariants tested
//!
//! - **Positions:** way node positions are exactly `0..k` in document order.
//! - **Problem keys:** keys containing a problem character never emit tags.
//! - **Namespaces:** namespaced keys split at the first colon and re-join.
//! - **Ownership:** every tag record carries its owner's id.
//! - **Purity:** shaping twice yields equal output and leaves the input intact.

use proptest::prelude::*;
use wrangle_core::{CleaningRules, ElementKind, Shaper, SourceElement};

const PROBLEM_CHARS: &[char] = &[
    '=', '+', '/', '&', '<', '>', ';', '\'', '"', '?', '%', '#', '$', '@', ',', '.', ' ', '\t',
    '\r', '\n',
];

fn tag(key: &str, value: &str) -> SourceElement {
    SourceElement::new(ElementKind::Tag)
        .with_attribute("k", key)
        .with_attribute("v", value)
}

fn way_with_refs(id: u64, refs: &[u64]) -> SourceElement {
    refs.iter().fold(
        SourceElement::new(ElementKind::Way).with_attribute("id", id.to_string()),
        |way, node_id| {
            way.with_child(
                SourceElement::new(ElementKind::Nd).with_attribute("ref", node_id.to_string()),
            )
        },
    )
}

fn problem_key() -> impl Strategy<Value = String> {
    (
        "[a-z_:]{0,6}",
        prop::sample::select(PROBLEM_CHARS),
        "[a-zA-Z_:]{0,6}",
    )
        .prop_map(|(head, ch, tail)| format!("{head}{ch}{tail}"))
}

fn tagged_element() -> impl Strategy<Value = SourceElement> {
    (
        prop_oneof![Just(ElementKind::Node), Just(ElementKind::Way)],
        1_u64..10_000_000,
        prop::collection::vec(("[a-z_:A-Z]{1,12}", "[ -~]{0,16}"), 0..8),
    )
        .prop_map(|(kind, id, tags)| {
            tags.iter().fold(
                SourceElement::new(kind).with_attribute("id", id.to_string()),
                |element, (key, value)| element.with_child(tag(key, value)),
            )
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn way_node_positions_are_contiguous(
        id in 1_u64..1_000_000,
        refs in prop::collection::vec(1_u64..1_000_000, 0..32),
    ) {
        let rules = CleaningRules::default();
        let way = way_with_refs(id, &refs);
        let shaped = Shaper::new(&rules).shape(&way).expect("ways are shaped");

        prop_assert_eq!(shaped.way_nodes().len(), refs.len());
        for (index, (record, node_id)) in shaped.way_nodes().iter().zip(&refs).enumerate() {
            prop_assert_eq!(record.position, index);
            prop_assert_eq!(&record.node_id, &node_id.to_string());
            prop_assert_eq!(&record.way_id, &id.to_string());
        }
    }

    #[test]
    fn problem_keys_never_emit_tags(key in problem_key(), value in "[a-z ]{0,10}") {
        let rules = CleaningRules::default();
        let node = SourceElement::new(ElementKind::Node)
            .with_attribute("id", "1")
            .with_child(tag(&key, &value));
        let shaped = Shaper::new(&rules).shape(&node).expect("nodes are shaped");

        prop_assert!(shaped.tags().is_empty());
        prop_assert_eq!(shaped.skipped_tags(), 1);
    }

    #[test]
    fn namespaced_keys_split_and_rejoin(
        prefix in "[a-z_]{1,8}",
        rest in "[a-z_]{1,8}(:[a-z_]{1,8})?",
    ) {
        let rules = CleaningRules::default();
        let key = format!("{prefix}:{rest}");
        let node = SourceElement::new(ElementKind::Node)
            .with_attribute("id", "1")
            .with_child(tag(&key, "value"));
        let shaped = Shaper::new(&rules).shape(&node).expect("nodes are shaped");
        let record = shaped.tags().first().expect("one tag");

        prop_assert_eq!(&record.tag_type, &prefix);
        prop_assert_eq!(&record.key, &rest);
        prop_assert_eq!(format!("{}:{}", record.tag_type, record.key), key);
    }

    #[test]
    fn tags_carry_their_owner_id(element in tagged_element()) {
        let rules = CleaningRules::default();
        let shaped = Shaper::new(&rules).shape(&element).expect("entity is shaped");
        let owner = element.attribute("id").expect("generated with an id");

        for record in shaped.tags() {
            prop_assert_eq!(record.id.as_str(), owner);
        }
        prop_assert_eq!(
            shaped.tags().len() + shaped.skipped_tags(),
            element.tags().count()
        );
    }

    #[test]
    fn shaping_is_pure(element in tagged_element()) {
        let rules = CleaningRules::default();
        let shaper = Shaper::new(&rules);
        let before = element.clone();

        let first = shaper.shape(&element);
        let second = shaper.shape(&element);

        prop_assert_eq!(first, second);
        prop_assert_eq!(element, before);
    }
}
