use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::ecore::{EcoreType, SyntheticTag, ETYPE_FEATURE, LIST_FEATURES};
use super::payload::{remove_ordered, Payload};

/// Opaque node identity
///
/// Assigned when a node is built and never reused: a rebuild from the same
/// snapshot yields fresh ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One element of the mirrored model
///
/// The payload holds the element's own features. Containment features that
/// were expanded into children are held by those children and reassembled by
/// [`to_raw`](TreeNode::to_raw).
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: NodeId,
    /// Display name (derived, not authoritative)
    pub name: String,
    pub icon: String,
    pub kind: EcoreType,
    /// Containment feature this node hangs off its parent by
    pub property: Option<String>,
    /// Position within `property` on the parent
    pub index: Option<usize>,
    /// Discriminator injected into the payload by the builder, if any
    pub synthetic: Option<SyntheticTag>,
    pub payload: Payload,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Find a node by id anywhere in this subtree
    pub fn find(&self, id: &NodeId) -> Option<&TreeNode> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Display names from the first level below this node down to `id`
    ///
    /// Returns `None` when `id` is not in the subtree and an empty chain when
    /// `id` is this node.
    pub fn ancestor_names(&self, id: &NodeId) -> Option<Vec<String>> {
        if &self.id == id {
            return Some(Vec::new());
        }
        self.children.iter().find_map(|child| {
            child.ancestor_names(id).map(|mut chain| {
                chain.insert(0, child.name.clone());
                chain
            })
        })
    }

    /// Walk a display-name chain by exact name, first match per level
    pub fn find_by_names(&self, chain: &[String]) -> Option<&TreeNode> {
        let mut current = self;
        for name in chain {
            current = current.children.iter().find(|c| &c.name == name)?;
        }
        Some(current)
    }

    /// Children hanging off `feature`, in feature order
    pub fn children_of<'a>(&'a self, feature: &'a str) -> impl Iterator<Item = &'a TreeNode> + 'a {
        let mut matching: Vec<&TreeNode> = self
            .children
            .iter()
            .filter(|c| c.property.as_deref() == Some(feature))
            .collect();
        matching.sort_by_key(|c| c.index);
        matching.into_iter()
    }

    /// Number of entries `feature` holds, whether as children or in the payload
    pub fn feature_len(&self, feature: &str) -> usize {
        let held = self.children_of(feature).count();
        if held > 0 {
            return held;
        }
        self.payload
            .get(feature)
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Renumber the children of `feature` to match their order
    pub fn reindex(&mut self, feature: &str) {
        let mut next = 0;
        for child in self.children.iter_mut() {
            if child.property.as_deref() == Some(feature) {
                child.index = Some(next);
                next += 1;
            }
        }
    }

    /// Payload with containments reassembled, discriminator included
    ///
    /// This is the shape label and icon resolution is computed from.
    pub fn label_view(&self) -> Payload {
        let mut view = self.payload.clone();
        for feature in LIST_FEATURES {
            let items: Vec<Value> = self.children_of(feature).map(TreeNode::to_raw).collect();
            if !items.is_empty() {
                view.insert(feature.to_string(), Value::Array(items));
            }
        }
        if let Some(child) = self.children_of(ETYPE_FEATURE).next() {
            view.insert(ETYPE_FEATURE.to_string(), child.to_raw());
        }
        view
    }

    /// Reassemble the raw model element this node mirrors
    pub fn to_raw(&self) -> Value {
        let mut raw = self.label_view();
        if let Some(tag) = self.synthetic {
            remove_ordered(&mut raw, tag.field());
        }
        Value::Object(raw)
    }

    /// Number of nodes in this subtree
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    /// Depth-first walk of this subtree
    pub fn walk(&self, visit: &mut impl FnMut(&TreeNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(name: &str, property: &str, index: usize) -> TreeNode {
        let mut payload = Payload::new();
        payload.insert("name".to_string(), json!(name));
        TreeNode {
            id: NodeId::new(),
            name: name.to_string(),
            icon: String::new(),
            kind: EcoreType::Unknown,
            property: Some(property.to_string()),
            index: Some(index),
            synthetic: None,
            payload,
            children: Vec::new(),
        }
    }

    fn root(children: Vec<TreeNode>) -> TreeNode {
        let mut payload = Payload::new();
        payload.insert("name".to_string(), json!("pkg"));
        TreeNode {
            id: NodeId::new(),
            name: "pkg".to_string(),
            icon: String::new(),
            kind: EcoreType::Package,
            property: None,
            index: None,
            synthetic: None,
            payload,
            children,
        }
    }

    #[test]
    fn test_node_ids_are_unique() {
        assert_ne!(NodeId::new(), NodeId::new());
    }

    #[test]
    fn test_ancestor_names_excludes_root() {
        let mut a = leaf("A", "eClassifiers", 0);
        let b = leaf("B", "eStructuralFeatures", 0);
        let b_id = b.id;
        a.children.push(b);
        let tree = root(vec![a]);

        assert_eq!(
            tree.ancestor_names(&b_id),
            Some(vec!["A".to_string(), "B".to_string()])
        );
        assert_eq!(tree.ancestor_names(&tree.id), Some(vec![]));
        assert_eq!(tree.ancestor_names(&NodeId::new()), None);
    }

    #[test]
    fn test_find_by_names_exact() {
        let tree = root(vec![leaf("Person", "eClassifiers", 0), leaf("Per", "eClassifiers", 1)]);
        let found = tree.find_by_names(&["Per".to_string()]).unwrap();
        assert_eq!(found.index, Some(1));
    }

    #[test]
    fn test_to_raw_groups_children_by_feature() {
        let mut tree = root(vec![
            leaf("A", "eClassifiers", 0),
            leaf("B", "eClassifiers", 1),
        ]);
        tree.payload.insert("eClassifiers".to_string(), json!([]));

        let raw = tree.to_raw();
        assert_eq!(
            raw,
            json!({"name": "pkg", "eClassifiers": [{"name": "A"}, {"name": "B"}]})
        );
    }

    #[test]
    fn test_to_raw_strips_synthetic_tag() {
        let mut literal = leaf("RED", "eLiterals", 0);
        literal.payload.insert("type".to_string(), json!("EEnumLiteral"));
        literal.synthetic = Some(SyntheticTag::EnumLiteral);

        assert_eq!(literal.to_raw(), json!({"name": "RED"}));
        assert_eq!(literal.label_view().get("type"), Some(&json!("EEnumLiteral")));
    }

    #[test]
    fn test_reindex_only_touches_feature() {
        let mut tree = root(vec![
            leaf("A", "eClassifiers", 2),
            leaf("op", "eOperations", 0),
            leaf("B", "eClassifiers", 5),
        ]);
        tree.reindex("eClassifiers");

        let indices: Vec<_> = tree.children.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![Some(0), Some(0), Some(1)]);
        assert_eq!(tree.feature_len("eClassifiers"), 2);
        assert_eq!(tree.node_count(), 4);
    }
}
