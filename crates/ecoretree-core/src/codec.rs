//! Owner path resolution and outbound edit encoding
//!
//! Owner references are resolved against the tree by a best-effort heuristic.
//! For each path segment the children of the current node are searched for:
//!
//! 1. a child whose id equals the segment,
//! 2. else the first child, in document order, whose display name contains
//!    the segment's identifier,
//! 3. else, for `@feature.N` segments, the child at position `N` of `feature`.
//!
//! Name matching can pick the wrong node when names overlap (`Book` also
//! matches `Bookshelf` if it comes first). The model server does not keep
//! stable ids across references, so the heuristic is kept as is.

use serde_json::Value;

use crate::commands::{Command, OwnerReference};
use crate::diff::ChangeSet;
use crate::errors::{Result, SyncError};
use crate::model::ecore::ETYPE_FEATURE;
use crate::model::payload::is_editable;
use crate::model::{Payload, TreeNode};

/// One segment of an owner path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Segment text as it appeared in the reference
    pub raw: String,
    /// Feature or element name, without `@` and index suffix
    pub identifier: String,
    /// Trailing digits, read as an index hint
    pub index: Option<usize>,
    /// Segment started with `@`, addressing a feature by position
    pub feature_addressed: bool,
}

impl PathSegment {
    pub fn parse(raw: &str) -> Self {
        let feature_addressed = raw.starts_with('@');
        let body = raw.trim_start_matches('@');
        let stem = body.trim_end_matches(|c: char| c.is_ascii_digit());
        let index = body[stem.len()..].parse::<usize>().ok();
        let identifier = match stem.strip_suffix('.') {
            Some(feature) if index.is_some() && !feature.is_empty() => feature,
            _ => body,
        };
        Self {
            raw: raw.to_string(),
            identifier: identifier.to_string(),
            index,
            feature_addressed,
        }
    }
}

/// Parsed owner reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerPath {
    pub reference: String,
    pub segments: Vec<PathSegment>,
}

/// Parse the path suffix of an owner reference
///
/// `#/` and `#` address the root. Empty segments are skipped.
///
/// # Errors
///
/// `InvalidOwnerReference` when the reference carries no `#`.
pub fn resolve_owner_path(owner: &OwnerReference) -> Result<OwnerPath> {
    let fragment = owner
        .fragment()
        .ok_or_else(|| SyncError::InvalidOwnerReference {
            reference: owner.reference.clone(),
        })?;
    let segments = fragment
        .split('/')
        .filter(|s| !s.is_empty())
        .map(PathSegment::parse)
        .collect();
    Ok(OwnerPath {
        reference: owner.reference.clone(),
        segments,
    })
}

fn match_child(node: &TreeNode, segment: &PathSegment) -> Option<usize> {
    if let Some(pos) = node
        .children
        .iter()
        .position(|c| c.id.to_string() == segment.raw)
    {
        return Some(pos);
    }
    if !segment.identifier.is_empty() {
        if let Some(pos) = node
            .children
            .iter()
            .position(|c| c.name.contains(&segment.identifier))
        {
            return Some(pos);
        }
    }
    if segment.feature_addressed {
        let index = segment.index?;
        return node.children.iter().position(|c| {
            c.property.as_deref() == Some(segment.identifier.as_str()) && c.index == Some(index)
        });
    }
    None
}

/// Child positions leading from `root` to the owner
///
/// # Errors
///
/// `OwnerNotFound` naming the first segment no child matched.
pub fn resolve_positions(root: &TreeNode, path: &OwnerPath) -> Result<Vec<usize>> {
    let mut positions = Vec::with_capacity(path.segments.len());
    let mut current = root;
    for segment in &path.segments {
        let pos = match_child(current, segment).ok_or_else(|| SyncError::OwnerNotFound {
            reference: path.reference.clone(),
            segment: segment.raw.clone(),
        })?;
        positions.push(pos);
        current = &current.children[pos];
    }
    Ok(positions)
}

/// Locate the owner node
///
/// # Errors
///
/// `OwnerNotFound` when a segment has no match.
pub fn locate<'a>(root: &'a TreeNode, path: &OwnerPath) -> Result<&'a TreeNode> {
    let positions = resolve_positions(root, path)?;
    Ok(positions
        .into_iter()
        .fold(root, |node, pos| &node.children[pos]))
}

/// Locate the owner node for mutation
///
/// # Errors
///
/// `OwnerNotFound` when a segment has no match.
pub fn locate_mut<'a>(root: &'a mut TreeNode, path: &OwnerPath) -> Result<&'a mut TreeNode> {
    let positions = resolve_positions(root, path)?;
    Ok(positions
        .into_iter()
        .fold(root, |node, pos| &mut node.children[pos]))
}

/// Locate the raw element of the owner inside the document
///
/// The path is resolved on the tree, then replayed on `document` through the
/// containment slots of the matched nodes, so both sides agree on the owner.
///
/// # Errors
///
/// `OwnerNotFound` when the path does not resolve, `InvalidSnapshot` when the
/// document does not have the shape the tree was built from.
pub fn locate_payload<'a>(
    document: &'a mut Value,
    root: &TreeNode,
    path: &OwnerPath,
) -> Result<&'a mut Payload> {
    let positions = resolve_positions(root, path)?;
    let mut node = root;
    let mut raw = document;
    for pos in positions {
        node = &node.children[pos];
        let (Some(property), Some(index)) = (node.property.as_deref(), node.index) else {
            return Err(SyncError::Internal {
                message: format!("node {} has no containment slot", node.id),
            });
        };
        let slot = raw.get_mut(property);
        raw = match slot {
            Some(value) if property == ETYPE_FEATURE => value,
            Some(Value::Array(items)) if index < items.len() => &mut items[index],
            _ => {
                return Err(SyncError::InvalidSnapshot {
                    reason: format!("document has no {}[{}] for '{}'", property, index, path.reference),
                })
            }
        };
    }
    raw.as_object_mut().ok_or_else(|| SyncError::InvalidSnapshot {
        reason: format!("owner '{}' is not an object", path.reference),
    })
}

/// Build the Set command for a local edit
///
/// Only the first changed field is sent, and only when the payload carries it
/// and it is editable. Returns `None` otherwise.
pub fn build_set_command(owner_base: &str, payload: &Payload, changes: &ChangeSet) -> Option<Command> {
    let feature = changes.first_field()?;
    if !is_editable(feature) {
        return None;
    }
    let value = payload.get(feature)?.clone();
    Some(Command::Set {
        owner: OwnerReference::for_element(owner_base, payload),
        feature: feature.to_string(),
        value,
    })
}
