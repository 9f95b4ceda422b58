//! Tree builder
//!
//! Converts a raw Ecore document into a [`TreeNode`] tree. Containment
//! features are visited in a fixed order: `eClassifiers`, `eSuperTypes`,
//! `eExceptions`, `eStructuralFeatures`, `eOperations`, `eLiterals`, then the
//! single contained `eType`. Each element becomes the last child of its parent.

use serde_json::Value;
use tracing::warn;

use crate::label::LabelResolver;
use crate::model::ecore::{is_containment_feature, EcoreType, SyntheticTag, ETYPE_FEATURE, LIST_FEATURES};
use crate::model::payload::remove_ordered;
use crate::model::{NodeId, Payload, TreeNode};

/// Build the tree for a whole document
///
/// Input that is not a non-empty object yields a degenerate node and a
/// warning.
pub fn build(snapshot: &Value, labels: &dyn LabelResolver) -> TreeNode {
    if snapshot.as_object().map_or(true, |o| o.is_empty()) {
        warn!(op = "build", "build called without data");
    }
    build_node(snapshot, None, None, labels)
}

/// Build a single element and its subtree
///
/// `property` and `index` give the containment slot the element occupies on
/// its parent; the synthetic discriminator is derived from `property`.
pub fn build_node(
    raw: &Value,
    property: Option<&str>,
    index: Option<usize>,
    labels: &dyn LabelResolver,
) -> TreeNode {
    let mut payload: Payload = raw.as_object().cloned().unwrap_or_default();

    let synthetic = property
        .and_then(SyntheticTag::for_feature)
        .filter(|tag| !payload.contains_key(tag.field()));
    if let Some(tag) = synthetic {
        payload.insert(tag.field().to_string(), Value::from(tag.value()));
    }

    let mut children = Vec::new();
    for feature in LIST_FEATURES {
        if is_expandable(feature, payload.get(feature)) {
            if let Some(Value::Array(items)) = remove_ordered(&mut payload, feature) {
                for (i, item) in items.iter().enumerate() {
                    children.push(build_node(item, Some(feature), Some(i), labels));
                }
            }
        }
    }
    if is_expandable(ETYPE_FEATURE, payload.get(ETYPE_FEATURE)) {
        if let Some(item) = remove_ordered(&mut payload, ETYPE_FEATURE) {
            children.push(build_node(&item, Some(ETYPE_FEATURE), Some(0), labels));
        }
    }

    let mut node = TreeNode {
        id: NodeId::new(),
        name: String::new(),
        icon: String::new(),
        kind: EcoreType::Unknown,
        property: property.map(str::to_string),
        index,
        synthetic,
        payload,
        children,
    };
    relabel(&mut node, labels);
    node
}

/// Whether a feature value is held as child nodes rather than in the payload
///
/// Lists are expanded only when non-empty and made of objects; `eType` only
/// when it is an object.
pub fn is_expandable(feature: &str, value: Option<&Value>) -> bool {
    if !is_containment_feature(feature) {
        return false;
    }
    match value {
        Some(Value::Object(_)) => feature == ETYPE_FEATURE,
        Some(Value::Array(items)) => {
            feature != ETYPE_FEATURE && !items.is_empty() && items.iter().all(Value::is_object)
        }
        _ => false,
    }
}

/// Recompute name, icon and type of a node from its label view
pub fn relabel(node: &mut TreeNode, labels: &dyn LabelResolver) {
    let view = node.label_view();
    node.name = labels.display_name(&view);
    node.icon = labels.icon(&view);
    node.kind = EcoreType::of(&node.payload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::EcoreLabelResolver;
    use crate::model::ecore::{ECLASS, EENUM, EPACKAGE};
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "eClass": EPACKAGE,
            "name": "library",
            "eClassifiers": [
                {
                    "eClass": ECLASS,
                    "name": "Book",
                    "eStructuralFeatures": [
                        {"eClass": "http://www.eclipse.org/emf/2002/Ecore#//EAttribute", "name": "title",
                         "eType": {"eClass": "http://www.eclipse.org/emf/2002/Ecore#//EDataType", "$ref": "//EString"}}
                    ],
                    "eOperations": [{"name": "borrow"}]
                },
                {
                    "eClass": EENUM,
                    "name": "Genre",
                    "eLiterals": [{"name": "FICTION"}, {"name": "POETRY", "value": 1}]
                }
            ]
        })
    }

    #[test]
    fn test_build_traversal_order() {
        let tree = build(&sample(), &EcoreLabelResolver);

        assert_eq!(tree.name, "library");
        assert_eq!(tree.kind, EcoreType::Package);
        let names: Vec<_> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Book", "Genre"]);

        let book = &tree.children[0];
        let props: Vec<_> = book.children.iter().map(|c| c.property.as_deref()).collect();
        assert_eq!(props, vec![Some("eStructuralFeatures"), Some("eOperations")]);
        assert_eq!(book.children[0].name, "title : EString");
        assert_eq!(book.children[0].children[0].property.as_deref(), Some("eType"));
        assert_eq!(book.children[0].children[0].index, Some(0));
    }

    #[test]
    fn test_build_injects_discriminators() {
        let tree = build(&sample(), &EcoreLabelResolver);

        let op = &tree.children[0].children[1];
        assert_eq!(op.synthetic, Some(SyntheticTag::Operation));
        assert_eq!(op.kind, EcoreType::Operation);

        let genre = &tree.children[1];
        assert_eq!(genre.children[0].name, "FICTION = 0");
        assert_eq!(genre.children[1].name, "POETRY = 1");
        assert_eq!(genre.children[1].payload.get("type"), Some(&json!("EEnumLiteral")));
    }

    #[test]
    fn test_build_payload_excludes_expanded_containments() {
        let tree = build(&sample(), &EcoreLabelResolver);
        assert!(!tree.payload.contains_key("eClassifiers"));
        assert!(!tree.children[0].children[0].payload.contains_key("eType"));
    }

    #[test]
    fn test_build_round_trip() {
        let snapshot = sample();
        let tree = build(&snapshot, &EcoreLabelResolver);
        assert_eq!(tree.to_raw(), snapshot);
    }

    #[test]
    fn test_build_assigns_fresh_ids() {
        let a = build(&sample(), &EcoreLabelResolver);
        let b = build(&sample(), &EcoreLabelResolver);
        assert_ne!(a.id, b.id);
        assert_ne!(a.children[0].id, b.children[0].id);
    }

    #[test]
    fn test_build_empty_input_is_degenerate() {
        let tree = build(&json!({}), &EcoreLabelResolver);
        assert!(tree.children.is_empty());
        assert!(tree.payload.is_empty());
        assert_eq!(tree.name, "");

        let tree = build(&Value::Null, &EcoreLabelResolver);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_empty_lists_stay_in_payload() {
        let snapshot = json!({"eClass": ECLASS, "name": "Empty", "eStructuralFeatures": []});
        let tree = build(&snapshot, &EcoreLabelResolver);
        assert!(tree.children.is_empty());
        assert_eq!(tree.payload.get("eStructuralFeatures"), Some(&json!([])));
        assert_eq!(tree.to_raw(), snapshot);
    }

    #[test]
    fn test_is_expandable() {
        assert!(is_expandable("eClassifiers", Some(&json!([{"name": "A"}]))));
        assert!(!is_expandable("eClassifiers", Some(&json!([]))));
        assert!(!is_expandable("eClassifiers", Some(&json!(["A"]))));
        assert!(is_expandable("eType", Some(&json!({"$ref": "//X"}))));
        assert!(!is_expandable("eAnnotations", Some(&json!([{"source": "x"}]))));
    }
}
