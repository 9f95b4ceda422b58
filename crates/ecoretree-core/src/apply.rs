//! Remote patch application
//!
//! This module provides `apply()`, the single entry point that mutates a
//! mirrored tree and its raw document in response to an inbound command.
//!
//! ## Atomicity Contract
//!
//! - **All-or-nothing**: the command is applied to copies of the tree and the
//!   document. Either every contained command succeeds and the copies are
//!   returned, or an error is returned and the caller's state is untouched.
//! - **No panics**: bad owners, indices or shapes return typed errors.
//! - **Consistency**: on success the returned document equals the returned
//!   tree's `to_raw()`.
//!
//! ## Example
//!
//! ```
//! use ecoretree_core::apply::apply;
//! use ecoretree_core::builder::build;
//! use ecoretree_core::commands::{Command, OwnerReference};
//! use ecoretree_core::label::EcoreLabelResolver;
//! use serde_json::json;
//!
//! let document = json!({
//!     "eClass": "http://www.eclipse.org/emf/2002/Ecore#//EPackage",
//!     "name": "library",
//!     "eClassifiers": [{"eClass": "http://www.eclipse.org/emf/2002/Ecore#//EClass", "name": "Book"}]
//! });
//! let tree = build(&document, &EcoreLabelResolver);
//! let cmd = Command::Set {
//!     owner: OwnerReference::new("file:/ws/library.ecore#//Book"),
//!     feature: "abstract".to_string(),
//!     value: json!("true"),
//! };
//!
//! let patched = apply(&tree, &document, &cmd, &EcoreLabelResolver).unwrap();
//! assert_eq!(patched.document["eClassifiers"][0]["abstract"], json!(true));
//! ```

use serde_json::Value;

use crate::builder::{build_node, is_expandable, relabel};
use crate::codec::{locate_payload, resolve_owner_path, resolve_positions};
use crate::commands::Command;
use crate::errors::{Result, SyncError};
use crate::label::LabelResolver;
use crate::model::ecore::{is_containment_feature, ETYPE_FEATURE};
use crate::model::payload::{coerce_scalar, remove_ordered};
use crate::model::{NodeId, Payload, TreeNode};

/// Result of a successful application
#[derive(Debug, Clone, PartialEq)]
pub struct Patched {
    pub root: TreeNode,
    pub document: Value,
    /// Nodes whose form data changed: Set targets and the owners of added or
    /// removed items
    pub touched: Vec<NodeId>,
    /// Nodes no longer in the tree
    pub removed: Vec<NodeId>,
}

/// Apply a command to a tree and its document, returning the patched copies
///
/// # Errors
///
/// Returns an error if an owner cannot be resolved, an index is out of range
/// or a feature does not have the shape the command expects. The inputs are
/// never modified.
pub fn apply(
    root: &TreeNode,
    document: &Value,
    cmd: &Command,
    labels: &dyn LabelResolver,
) -> Result<Patched> {
    let mut patched = Patched {
        root: root.clone(),
        document: document.clone(),
        touched: Vec::new(),
        removed: Vec::new(),
    };
    apply_in_place(&mut patched, cmd, labels)?;
    Ok(patched)
}

fn apply_in_place(state: &mut Patched, cmd: &Command, labels: &dyn LabelResolver) -> Result<()> {
    match cmd {
        Command::Compound { commands } => {
            for inner in commands {
                apply_in_place(state, inner, labels)?;
            }
            Ok(())
        }
        Command::Add {
            owner,
            feature,
            values,
        } => {
            if values.is_empty() {
                return Ok(());
            }
            let path = resolve_owner_path(owner)?;
            let positions = resolve_positions(&state.root, &path)?;

            let raw = locate_payload(&mut state.document, &state.root, &path)?;
            append_raw(raw, feature, values)?;

            let node = node_at_mut(&mut state.root, &positions)?;
            add_to_node(node, feature, values, labels)?;
            state.touched.push(node.id);
            relabel_with_parent(&mut state.root, &positions, labels)
        }
        Command::Remove {
            owner,
            feature,
            indices,
        } => {
            let path = resolve_owner_path(owner)?;
            let positions = resolve_positions(&state.root, &path)?;

            let mut descending = indices.clone();
            descending.sort_unstable_by(|a, b| b.cmp(a));
            descending.dedup();

            let raw = locate_payload(&mut state.document, &state.root, &path)?;
            remove_raw(raw, feature, &descending)?;

            let node = node_at_mut(&mut state.root, &positions)?;
            let removed = remove_from_node(node, feature, &descending)?;
            state.touched.push(node.id);
            state.removed.extend(removed);
            relabel_with_parent(&mut state.root, &positions, labels)
        }
        Command::Set {
            owner,
            feature,
            value,
        } => {
            let path = resolve_owner_path(owner)?;
            let positions = resolve_positions(&state.root, &path)?;
            let value = coerce_scalar(value.clone());

            let raw = locate_payload(&mut state.document, &state.root, &path)?;
            raw.insert(feature.clone(), value.clone());

            let node = node_at_mut(&mut state.root, &positions)?;
            let removed = set_on_node(node, feature, value, labels);
            state.touched.push(node.id);
            state.removed.extend(removed);
            relabel_with_parent(&mut state.root, &positions, labels)
        }
    }
}

fn node_at_mut<'a>(root: &'a mut TreeNode, positions: &[usize]) -> Result<&'a mut TreeNode> {
    let mut node = root;
    for &pos in positions {
        let len = node.children.len();
        node = node
            .children
            .get_mut(pos)
            .ok_or_else(|| SyncError::Internal {
                message: format!("child position {} out of {}", pos, len),
            })?;
    }
    Ok(node)
}

/// Labels depend on a node's own payload and its direct children
fn relabel_with_parent(
    root: &mut TreeNode,
    positions: &[usize],
    labels: &dyn LabelResolver,
) -> Result<()> {
    relabel(node_at_mut(root, positions)?, labels);
    if let Some((_, parent)) = positions.split_last() {
        relabel(node_at_mut(root, parent)?, labels);
    }
    Ok(())
}

fn list_mut<'a>(raw: &'a mut Payload, feature: &str) -> Result<&'a mut Vec<Value>> {
    match raw.get_mut(feature) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(SyncError::FeatureNotAList {
            feature: feature.to_string(),
        }),
    }
}

fn append_raw(raw: &mut Payload, feature: &str, values: &[Payload]) -> Result<()> {
    if feature == ETYPE_FEATURE {
        return Err(SyncError::FeatureNotAList {
            feature: feature.to_string(),
        });
    }
    if !raw.contains_key(feature) {
        raw.insert(feature.to_string(), Value::Array(Vec::new()));
    }
    list_mut(raw, feature)?.extend(values.iter().cloned().map(Value::Object));
    Ok(())
}

fn add_to_node(
    node: &mut TreeNode,
    feature: &str,
    values: &[Payload],
    labels: &dyn LabelResolver,
) -> Result<()> {
    let held = node.children_of(feature).count();
    let expands = is_containment_feature(feature)
        && match node.payload.get(feature) {
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
            None => true,
        };

    if !expands {
        if !node.payload.contains_key(feature) {
            node.payload
                .insert(feature.to_string(), Value::Array(Vec::new()));
        }
        list_mut(&mut node.payload, feature)?.extend(values.iter().cloned().map(Value::Object));
        return Ok(());
    }

    remove_ordered(&mut node.payload, feature);
    for (offset, value) in values.iter().enumerate() {
        let child = build_node(
            &Value::Object(value.clone()),
            Some(feature),
            Some(held + offset),
            labels,
        );
        node.children.push(child);
    }
    Ok(())
}

fn check_indices(feature: &str, descending: &[usize], len: usize) -> Result<()> {
    match descending.first() {
        Some(&index) if index >= len => Err(SyncError::IndexOutOfRange {
            feature: feature.to_string(),
            index,
            len,
        }),
        _ => Ok(()),
    }
}

fn remove_raw(raw: &mut Payload, feature: &str, descending: &[usize]) -> Result<()> {
    if feature == ETYPE_FEATURE {
        return Err(SyncError::FeatureNotAList {
            feature: feature.to_string(),
        });
    }
    let Some(items) = raw.get_mut(feature) else {
        return check_indices(feature, descending, 0);
    };
    let Value::Array(items) = items else {
        return Err(SyncError::FeatureNotAList {
            feature: feature.to_string(),
        });
    };
    check_indices(feature, descending, items.len())?;
    for &index in descending {
        items.remove(index);
    }
    Ok(())
}

fn remove_from_node(node: &mut TreeNode, feature: &str, descending: &[usize]) -> Result<Vec<NodeId>> {
    let held = node.children_of(feature).count();
    if held == 0 {
        let len = node.feature_len(feature);
        check_indices(feature, descending, len)?;
        if let Some(Value::Array(items)) = node.payload.get_mut(feature) {
            for &index in descending {
                items.remove(index);
            }
        }
        return Ok(Vec::new());
    }

    check_indices(feature, descending, held)?;
    let mut removed = Vec::new();
    for &index in descending {
        let pos = node
            .children
            .iter()
            .position(|c| c.property.as_deref() == Some(feature) && c.index == Some(index))
            .ok_or_else(|| SyncError::Internal {
                message: format!("no child at {}[{}]", feature, index),
            })?;
        let child = node.children.remove(pos);
        child.walk(&mut |n| removed.push(n.id));
    }
    node.reindex(feature);
    if node.children_of(feature).next().is_none() {
        node.payload
            .insert(feature.to_string(), Value::Array(Vec::new()));
    }
    Ok(removed)
}

fn set_on_node(
    node: &mut TreeNode,
    feature: &str,
    value: Value,
    labels: &dyn LabelResolver,
) -> Vec<NodeId> {
    if node.synthetic.map(|tag| tag.field()) == Some(feature) {
        node.synthetic = None;
    }
    if !is_containment_feature(feature) {
        node.payload.insert(feature.to_string(), value);
        return Vec::new();
    }

    let mut removed = Vec::new();
    let mut kept = Vec::with_capacity(node.children.len());
    for child in std::mem::take(&mut node.children) {
        if child.property.as_deref() == Some(feature) {
            child.walk(&mut |n| removed.push(n.id));
        } else {
            kept.push(child);
        }
    }
    node.children = kept;

    if !is_expandable(feature, Some(&value)) {
        node.payload.insert(feature.to_string(), value);
        return removed;
    }
    remove_ordered(&mut node.payload, feature);
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                node.children
                    .push(build_node(item, Some(feature), Some(i), labels));
            }
        }
        other => node
            .children
            .push(build_node(&other, Some(feature), Some(0), labels)),
    }
    removed
}
