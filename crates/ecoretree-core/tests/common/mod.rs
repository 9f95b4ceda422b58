use ecoretree_core::commands::OwnerReference;
use ecoretree_core::model::ecore::{EATTRIBUTE, ECLASS, EDATATYPE, EENUM, EPACKAGE, EREFERENCE};
use ecoretree_core::Payload;
use serde_json::{json, Value};

pub const BASE: &str = "file:/workspace/library.ecore";

/// A small but complete library metamodel
#[allow(dead_code)]
pub fn library() -> Value {
    json!({
        "eClass": EPACKAGE,
        "name": "library",
        "nsURI": "http://example.org/library",
        "nsPrefix": "lib",
        "eClassifiers": [
            {
                "eClass": ECLASS,
                "name": "Named",
                "abstract": true,
                "eStructuralFeatures": [
                    {"eClass": EATTRIBUTE, "name": "name",
                     "eType": {"eClass": EDATATYPE, "$ref": "http://www.eclipse.org/emf/2002/Ecore#//EString"}}
                ]
            },
            {
                "eClass": ECLASS,
                "name": "Book",
                "eSuperTypes": [{"eClass": ECLASS, "$ref": "//Named"}],
                "eStructuralFeatures": [
                    {"eClass": EATTRIBUTE, "name": "pages",
                     "eType": {"eClass": EDATATYPE, "$ref": "//Pages"}},
                    {"eClass": EREFERENCE, "name": "genre",
                     "eType": {"eClass": EENUM, "$ref": "//Genre"}}
                ],
                "eOperations": [
                    {"name": "borrow", "eExceptions": [{"eClass": ECLASS, "$ref": "//Named"}]}
                ]
            },
            {
                "eClass": EDATATYPE,
                "name": "Pages",
                "instanceClassName": "int"
            },
            {
                "eClass": EENUM,
                "name": "Genre",
                "eLiterals": [
                    {"name": "FICTION"},
                    {"name": "POETRY", "value": 1},
                    {"name": "DRAMA", "value": 2}
                ]
            }
        ]
    })
}

#[allow(dead_code)]
pub fn owner(fragment: &str) -> OwnerReference {
    OwnerReference::new(format!("{}#{}", BASE, fragment))
}

#[allow(dead_code)]
pub fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}
