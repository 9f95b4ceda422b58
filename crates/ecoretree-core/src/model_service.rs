//! Read-only accessors for a rendering layer
//!
//! Gives the detail view the data, JSON schema and UI schema for a node, and
//! the creatable children per element type.

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::model::ecore::{
    self, EcoreType, EATTRIBUTE, ECLASS, EDATATYPE, EENUM, EOPERATION, REF_FIELD,
};
use crate::model::{Payload, TreeNode};

const STRING: &str = "string";
const BOOLEAN: &str = "boolean";
const INTEGER: &str = "integer";

const CLASSIFIER_PROPERTIES: [(&str, &str); 5] = [
    ("name", STRING),
    ("instanceClassName", STRING),
    ("instanceClass", STRING),
    ("defaultValue", STRING),
    ("instanceTypeName", STRING),
];

const FEATURE_PROPERTIES: [(&str, &str); 15] = [
    ("name", STRING),
    ("ordered", BOOLEAN),
    ("unique", BOOLEAN),
    ("lowerBound", INTEGER),
    ("upperBound", INTEGER),
    ("many", BOOLEAN),
    ("required", BOOLEAN),
    ("changeable", BOOLEAN),
    ("volatile", BOOLEAN),
    ("transient", BOOLEAN),
    ("defaultValueLiteral", STRING),
    ("defaultValue", STRING),
    ("unsettable", BOOLEAN),
    ("derived", BOOLEAN),
    ("iD", BOOLEAN),
];

fn definition(key: &str, title: &str, e_class: Option<&str>, properties: &[(&str, &str)]) -> Value {
    let mut props = Map::new();
    if let Some(e_class) = e_class {
        props.insert("eClass".to_string(), json!({ "const": e_class }));
    }
    for (name, kind) in properties {
        let mut prop = json!({ "type": kind });
        match *name {
            "lowerBound" => prop["default"] = json!(0),
            "upperBound" => prop["default"] = json!(1),
            _ => {}
        }
        props.insert(name.to_string(), prop);
    }
    json!({
        "$id": format!("#{}", key),
        "title": title,
        "type": "object",
        "properties": props,
        "additionalProperties": false,
    })
}

fn type_schema() -> Value {
    let classifier_with = |extra: (&'static str, &'static str)| {
        let mut props = CLASSIFIER_PROPERTIES.to_vec();
        props.push(extra);
        props
    };
    let attribute: Vec<_> = FEATURE_PROPERTIES.to_vec();
    let reference: Vec<_> = FEATURE_PROPERTIES
        .iter()
        .copied()
        .filter(|(name, _)| *name != "iD")
        .chain([
            ("containment", BOOLEAN),
            ("container", BOOLEAN),
            ("resolveProxies", BOOLEAN),
        ])
        .collect();

    let mut literal = definition(
        "eenumliteral",
        "EEnumLiteral",
        Some("http://www.eclipse.org/emf/2002/Ecore#//EEnumLiteral"),
        &[("name", STRING), ("value", INTEGER), ("instance", STRING), ("literal", STRING)],
    );
    literal["properties"]["eEnum"] = json!({ "$ref": "#/definitions/eenum" });

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "$id": "http://www.eclipse.org/emf/2002/Ecore",
        "title": "JSON type schema for 'ecore'",
        "type": "object",
        "definitions": {
            "eclass": definition("eclass", "EClass", Some(ECLASS), &classifier_with(("abstract", BOOLEAN))
                .into_iter()
                .chain([("interface", BOOLEAN)])
                .collect::<Vec<_>>()),
            "edatatype": definition("edatatype", "EDataType", Some(EDATATYPE), &classifier_with(("serializable", BOOLEAN))),
            "eenum": definition("eenum", "EEnum", Some(EENUM), &classifier_with(("serializable", BOOLEAN))),
            "epackage": definition("epackage", "EPackage", Some(ecore::EPACKAGE),
                &[("name", STRING), ("nsURI", STRING), ("nsPrefix", STRING)]),
            "ereference": definition("ereference", "EReference", Some(ecore::EREFERENCE), &reference),
            "eenumliteral": literal,
            "eattribute": definition("eattribute", "EAttribute", Some(EATTRIBUTE), &attribute),
            "etype": definition("etype", "EType", None,
                &[("eClassifier", STRING), ("eTypeParameter", STRING)]),
        }
    })
}

/// Vertical layout with a label and one control per property
fn vertical_layout(text: &str, controls: &[(&str, bool)]) -> Value {
    let mut elements = vec![json!({ "type": "Label", "text": text })];
    for (property, disabled) in controls {
        let mut control = json!({
            "type": "Control",
            "scope": format!("#/properties/{}", property),
        });
        if *disabled {
            control["rule"] = json!({ "effect": "DISABLE", "condition": {} });
        }
        elements.push(control);
    }
    json!({ "type": "VerticalLayout", "elements": elements })
}

fn ui_schema(kind: EcoreType) -> Option<Value> {
    let schema = match kind {
        EcoreType::Package => vertical_layout(
            "EPackage",
            &[("name", true), ("nsURI", false), ("nsPrefix", false)],
        ),
        EcoreType::EnumLiteral => vertical_layout(
            "EEnumLiteral",
            &[("name", true), ("value", false), ("literal", false)],
        ),
        EcoreType::Enum => vertical_layout(
            "Classifier - EEnum",
            &[
                ("name", true),
                ("instanceClassName", true),
                ("instanceClass", true),
                ("serializable", false),
            ],
        ),
        EcoreType::Class => vertical_layout(
            "Classifier - EClass",
            &[
                ("name", true),
                ("instanceClassName", true),
                ("instanceClass", true),
                ("abstract", false),
                ("interface", false),
            ],
        ),
        EcoreType::Reference => vertical_layout(
            "EReference",
            &[
                ("name", true),
                ("lowerBound", false),
                ("upperBound", false),
                ("containment", false),
                ("transient", false),
                ("derived", false),
                ("ordered", false),
                ("unique", false),
                ("changeable", false),
                ("volatile", false),
                ("unsettable", false),
                ("resolveProxies", false),
            ],
        ),
        EcoreType::Attribute => vertical_layout(
            "EAttribute",
            &[
                ("name", true),
                ("lowerBound", false),
                ("upperBound", false),
                ("defaultValueLiteral", false),
                ("transient", false),
                ("derived", false),
                ("ordered", false),
                ("unique", false),
                ("changeable", false),
                ("volatile", false),
                ("unsettable", false),
                ("iD", false),
            ],
        ),
        EcoreType::DataType => vertical_layout(
            "Classifier - EDataType",
            &[
                ("name", true),
                ("instanceClassName", false),
                ("instanceClass", false),
                ("defaultValue", false),
                ("serializable", false),
            ],
        ),
        EcoreType::TypeRef | EcoreType::GenericSuperType => vertical_layout(
            "EType",
            &[("eClassifier", true), ("eTypeParameter", true)],
        ),
        _ => return None,
    };
    Some(schema)
}

/// Data, schema and UI schema accessors over mirrored nodes
#[derive(Debug, Clone)]
pub struct ModelService {
    type_schema: Value,
}

impl Default for ModelService {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelService {
    pub fn new() -> Self {
        Self {
            type_schema: type_schema(),
        }
    }

    /// The whole Ecore type schema
    pub fn type_schema(&self) -> &Value {
        &self.type_schema
    }

    /// Form data for a node
    ///
    /// Type references also get `eClassifier` (the name after `//`) and an
    /// empty `eTypeParameter`.
    pub fn get_data_for_node(&self, node: &TreeNode) -> Payload {
        let mut data = node.label_view();
        if ecore::is_type_ref(&data) {
            let classifier = data
                .get(REF_FIELD)
                .and_then(Value::as_str)
                .and_then(|r| r.split("//").nth(1))
                .unwrap_or_default()
                .to_string();
            data.insert("eClassifier".to_string(), Value::from(classifier));
            data.insert("eTypeParameter".to_string(), Value::from(""));
        }
        data
    }

    /// JSON schema of a node's element type, with all definitions attached
    ///
    /// `parent` is used to recognise literals that carry no discriminator.
    pub fn get_schema_for_node(&self, node: &TreeNode, parent: Option<&TreeNode>) -> Option<Value> {
        let key = match node.kind {
            EcoreType::TypeRef | EcoreType::GenericSuperType => "etype".to_string(),
            EcoreType::EnumLiteral => "eenumliteral".to_string(),
            _ => match node.payload.get(ecore::ECLASS_FIELD).and_then(Value::as_str) {
                Some(e_class) => ecore::type_name(e_class).to_lowercase(),
                None if parent.map(|p| p.kind) == Some(EcoreType::Enum)
                    || node.payload.contains_key("value") =>
                {
                    "eenumliteral".to_string()
                }
                None => return None,
            },
        };
        let definitions = self.type_schema.get("definitions")?;
        let Value::Object(element) = definitions.get(&key)?.clone() else {
            return None;
        };
        let mut schema = Map::new();
        schema.insert("definitions".to_string(), definitions.clone());
        schema.extend(element);
        Some(Value::Object(schema))
    }

    /// UI schema for a node; logs a warning for unregistered types
    pub fn get_ui_schema_for_node(&self, node: &TreeNode) -> Option<Value> {
        let kind = match node.kind {
            EcoreType::Unknown if !node.payload.contains_key(ecore::ECLASS_FIELD) => {
                EcoreType::EnumLiteral
            }
            kind => kind,
        };
        let schema = ui_schema(kind);
        if schema.is_none() {
            let type_uri = node
                .payload
                .get(ecore::ECLASS_FIELD)
                .and_then(Value::as_str)
                .unwrap_or(kind.name());
            warn!(op = "get_ui_schema_for_node", "Can't find registered ui schema for type {}", type_uri);
        }
        schema
    }

    /// Type URIs of the elements that can be created under `kind`
    pub fn children_mapping(kind: EcoreType) -> &'static [&'static str] {
        const PACKAGE_CHILDREN: [&str; 3] = [ECLASS, EDATATYPE, EENUM];
        const CLASS_CHILDREN: [&str; 3] = [EATTRIBUTE, ecore::EREFERENCE, EOPERATION];
        const ENUM_CHILDREN: [&str; 1] = ["EEnumLiteral"];
        match kind {
            EcoreType::Package => &PACKAGE_CHILDREN,
            EcoreType::Class => &CLASS_CHILDREN,
            EcoreType::Enum => &ENUM_CHILDREN,
            _ => &[],
        }
    }

    pub fn has_creatable_children(node: &TreeNode) -> bool {
        !Self::children_mapping(node.kind).is_empty()
    }

    /// Short name of a type URI
    pub fn name_for_type(type_uri: &str) -> &str {
        ecore::type_name(type_uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::label::EcoreLabelResolver;
    use crate::model::ecore::EPACKAGE;

    fn tree() -> TreeNode {
        build(
            &json!({
                "eClass": EPACKAGE,
                "name": "library",
                "eClassifiers": [
                    {"eClass": ECLASS, "name": "Book", "eStructuralFeatures": [
                        {"eClass": EATTRIBUTE, "name": "title",
                         "eType": {"eClass": EDATATYPE, "$ref": "//EString"}}
                    ], "eOperations": [{"name": "borrow"}]},
                    {"eClass": EENUM, "name": "Color", "eLiterals": [{"name": "RED"}]}
                ]
            }),
            &EcoreLabelResolver,
        )
    }

    #[test]
    fn test_data_for_type_ref() {
        let tree = tree();
        let etype = &tree.children[0].children[0].children[0];
        let data = ModelService::new().get_data_for_node(etype);
        assert_eq!(data["eClassifier"], json!("EString"));
        assert_eq!(data["eTypeParameter"], json!(""));
    }

    #[test]
    fn test_data_includes_containments() {
        let tree = tree();
        let data = ModelService::new().get_data_for_node(&tree.children[1]);
        assert_eq!(data["eLiterals"], json!([{"name": "RED"}]));
    }

    #[test]
    fn test_schema_for_class() {
        let tree = tree();
        let schema = ModelService::new()
            .get_schema_for_node(&tree.children[0], Some(&tree))
            .unwrap();
        assert_eq!(schema["title"], json!("EClass"));
        assert_eq!(schema["properties"]["abstract"]["type"], json!("boolean"));
        assert!(schema["definitions"]["eenum"].is_object());
    }

    #[test]
    fn test_schema_for_literal_and_etype() {
        let tree = tree();
        let service = ModelService::new();
        let color = &tree.children[1];
        let literal = service.get_schema_for_node(&color.children[0], Some(color)).unwrap();
        assert_eq!(literal["title"], json!("EEnumLiteral"));

        let etype = &tree.children[0].children[0].children[0];
        let schema = service.get_schema_for_node(etype, None).unwrap();
        assert_eq!(schema["title"], json!("EType"));
    }

    #[test]
    fn test_schema_for_operation_is_none() {
        let tree = tree();
        let op = &tree.children[0].children[1];
        assert_eq!(ModelService::new().get_schema_for_node(op, None), None);
    }

    #[test]
    fn test_ui_schema_disables_name() {
        let tree = tree();
        let ui = ModelService::new().get_ui_schema_for_node(&tree).unwrap();
        assert_eq!(ui["type"], json!("VerticalLayout"));
        assert_eq!(ui["elements"][0]["text"], json!("EPackage"));
        assert_eq!(ui["elements"][1]["scope"], json!("#/properties/name"));
        assert_eq!(ui["elements"][1]["rule"]["effect"], json!("DISABLE"));
        assert!(ui["elements"][2].get("rule").is_none());
    }

    #[test]
    fn test_ui_schema_unknown_type() {
        let tree = tree();
        let op = &tree.children[0].children[1];
        assert_eq!(ModelService::new().get_ui_schema_for_node(op), None);
    }

    #[test]
    fn test_children_mapping() {
        assert_eq!(ModelService::children_mapping(EcoreType::Package).len(), 3);
        assert_eq!(ModelService::children_mapping(EcoreType::Enum), &["EEnumLiteral"]);
        assert!(ModelService::children_mapping(EcoreType::Attribute).is_empty());
        assert_eq!(ModelService::name_for_type(ECLASS), "EClass");
    }
}
