//! Property tests for the flatten / diff / merge algebra.

use indexmap::IndexMap;
use proptest::prelude::*;
use translatabot_core::{
    diff, flatten, merge, unflatten, Change, FlatMap, FlatPath, LocalizationDocument, Node,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn key() -> impl Strategy<Value = String> {
    "[a-c.\\[\\]\\\\]{0,3}"
}

fn node() -> impl Strategy<Value = Node> {
    let leaf = "[a-zA-Z0-9 ]{0,6}".prop_map(Node::Text);
    leaf.prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Node::List),
            prop::collection::vec((key(), inner), 1..4)
                .prop_map(|pairs| Node::Map(pairs.into_iter().collect::<IndexMap<_, _>>())),
        ]
    })
}

fn document() -> impl Strategy<Value = LocalizationDocument> {
    prop::collection::vec((key(), node()), 0..6)
        .prop_map(|pairs| LocalizationDocument::new(pairs.into_iter().collect()))
}

/// Small key/value alphabets so previous and current revisions overlap.
fn flat_map() -> impl Strategy<Value = FlatMap> {
    prop::collection::vec(("[a-f]", "[xy]"), 0..8).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(k, v)| (FlatPath::key(k), v))
            .collect()
    })
}

fn entries(map: &FlatMap) -> Vec<(String, String)> {
    map.iter().map(|(p, v)| (p.to_string(), v.clone())).collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn round_trip_is_exact(d in document()) {
        let flat = flatten(&d);
        let back = unflatten(&flat).expect("unflatten");
        prop_assert_eq!(&back, &d);
        prop_assert_eq!(entries(&flatten(&back)), entries(&flat));
    }

    #[test]
    fn rendered_paths_parse_back(d in document()) {
        for (path, _) in &flatten(&d) {
            prop_assert_eq!(&FlatPath::parse(&path.to_string()).expect("parse"), path);
        }
    }

    #[test]
    fn diff_is_complete_and_exact(prev in flat_map(), curr in flat_map()) {
        let cs = diff(&prev, &curr);

        let mut union: Vec<&FlatPath> = curr.paths().collect();
        union.extend(prev.paths().filter(|p| !curr.contains(p)));
        prop_assert_eq!(cs.len(), union.len());

        for path in union {
            let expected = match (prev.get(path), curr.get(path)) {
                (None, Some(_)) => Change::Added,
                (Some(_), None) => Change::Removed,
                (Some(a), Some(b)) if a == b => Change::Unchanged,
                (Some(_), Some(_)) => Change::Modified,
                (None, None) => unreachable!(),
            };
            prop_assert_eq!(cs.get(path), Some(expected));
        }
    }

    #[test]
    fn merge_preserves_unchanged_and_drops_removed(
        prev in flat_map(),
        curr in flat_map(),
        target in flat_map(),
    ) {
        let cs = diff(&prev, &curr);
        let translations: FlatMap = curr
            .iter()
            .map(|(p, v)| (p.clone(), format!("<tr({v})>")))
            .collect();
        let merged = merge(&target, &cs, &translations).expect("merge");

        for (path, change) in cs.iter() {
            match change {
                Change::Unchanged => {
                    if let Some(existing) = target.get(path) {
                        prop_assert_eq!(merged.get(path), Some(existing));
                    }
                }
                Change::Removed => prop_assert!(!merged.contains(path)),
                Change::Added | Change::Modified => {
                    prop_assert_eq!(merged.get(path), translations.get(path));
                }
            }
        }
    }
}
