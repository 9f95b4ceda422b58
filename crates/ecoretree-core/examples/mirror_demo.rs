//! Mirror Demonstration
//!
//! Walks one editor mirror through the messages a model server pushes.
#![allow(clippy::unwrap_used, clippy::expect_used)]
//!
//! Key concepts illustrated:
//! 1. Building the tree from a snapshot
//! 2. Incremental commands patching tree and document together
//! 3. Dropped messages leaving the mirror untouched
//! 4. Local edits becoming a single Set command

use ecoretree_core::codec::build_set_command;
use ecoretree_core::mirror::PushMessage;
use ecoretree_core::{diff, EcoreLabelResolver, Mirror, ModelService, TreeNode};
use serde_json::json;
use std::sync::Arc;

const ECORE: &str = "http://www.eclipse.org/emf/2002/Ecore#//";

fn print_tree(node: &TreeNode, depth: usize) {
    println!("{}{} [{}]", "  ".repeat(depth), node.name, node.icon);
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== ecoretree Mirror Demo ===\n");

    // ===== Part 1: Full update =====
    println!("## Part 1: Snapshot\n");

    let mut mirror = Mirror::new("library.ecore", Arc::new(EcoreLabelResolver));
    let outcome = mirror.handle_push(PushMessage::FullUpdate(json!({
        "eClass": format!("{}EPackage", ECORE),
        "name": "library",
        "eClassifiers": [
            {"eClass": format!("{}EClass", ECORE), "name": "Book",
             "eStructuralFeatures": [{"eClass": format!("{}EAttribute", ECORE), "name": "title"}]},
            {"eClass": format!("{}EEnum", ECORE), "name": "Genre",
             "eLiterals": [{"name": "FICTION"}]}
        ]
    })));
    println!("{:?}", outcome);
    print_tree(mirror.root().unwrap(), 0);

    // ===== Part 2: Incremental updates =====
    println!("\n## Part 2: Incremental updates\n");

    let outcome = mirror.handle_push(PushMessage::IncrementalUpdate(json!({
        "type": "add",
        "owner": {"$ref": "file:/ws/library.ecore#//Genre"},
        "feature": "eLiterals",
        "objectsToAdd": [{"name": "POETRY", "value": 1}]
    })));
    println!("add literal: {:?}", outcome);

    let outcome = mirror.handle_push(PushMessage::IncrementalUpdate(json!({
        "type": "set",
        "owner": {"$ref": "file:/ws/library.ecore#//Book"},
        "feature": "abstract",
        "dataValues": ["true"]
    })));
    println!("set abstract: {:?}", outcome);
    print_tree(mirror.root().unwrap(), 0);
    assert_eq!(mirror.document(), Some(&mirror.root().unwrap().to_raw()));

    // ===== Part 3: Dropped message =====
    println!("\n## Part 3: Dropped message\n");

    let before = mirror.document().cloned();
    let outcome = mirror.handle_push(PushMessage::IncrementalUpdate(json!({
        "type": "remove",
        "owner": {"$ref": "file:/ws/library.ecore#//Genre"},
        "feature": "eLiterals",
        "indices": [7]
    })));
    println!("out of range remove: {:?}", outcome);
    assert_eq!(mirror.document().cloned(), before);

    // ===== Part 4: Local edit =====
    println!("\n## Part 4: Local edit\n");

    let book = mirror.root().unwrap().children[0].clone();
    let baseline = ModelService::new().get_data_for_node(&book);
    let mut edited = baseline.clone();
    edited.insert("name".to_string(), json!("Novel"));
    edited.insert("interface".to_string(), json!(true));

    let changes = diff(&edited, &baseline);
    println!("changed fields: {:?}", changes.fields().collect::<Vec<_>>());
    if let Some(command) = build_set_command("file:/ws/library.ecore", &edited, &changes) {
        println!("sent: {}", serde_json::to_string_pretty(&command.to_wire())?);
    }

    Ok(())
}
