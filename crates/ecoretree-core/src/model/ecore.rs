//! Ecore vocabulary used by the tree mirror
//!
//! Type URIs as they appear in the `eClass` field of the raw model, the
//! containment features the tree builder expands, and the synthetic
//! discriminators it injects for shapes that would otherwise be ambiguous.

use serde_json::Value;

use super::payload::Payload;

pub const EPACKAGE: &str = "http://www.eclipse.org/emf/2002/Ecore#//EPackage";
pub const EATTRIBUTE: &str = "http://www.eclipse.org/emf/2002/Ecore#//EAttribute";
pub const ECLASS: &str = "http://www.eclipse.org/emf/2002/Ecore#//EClass";
pub const EDATATYPE: &str = "http://www.eclipse.org/emf/2002/Ecore#//EDataType";
pub const EENUM: &str = "http://www.eclipse.org/emf/2002/Ecore#//EEnum";
pub const EREFERENCE: &str = "http://www.eclipse.org/emf/2002/Ecore#//EReference";
pub const EOPERATION: &str = "http://www.eclipse.org/emf/2002/Ecore#//EOperation";

/// Field holding the type URI of an element
pub const ECLASS_FIELD: &str = "eClass";
/// Field holding a synthetic discriminator
pub const TYPE_FIELD: &str = "type";
/// Field holding a cross-document reference
pub const REF_FIELD: &str = "$ref";

/// Multi-valued containment features, in builder traversal order
pub const LIST_FEATURES: [&str; 6] = [
    "eClassifiers",
    "eSuperTypes",
    "eExceptions",
    "eStructuralFeatures",
    "eOperations",
    "eLiterals",
];

/// Single-valued contained type reference, visited last
pub const ETYPE_FEATURE: &str = "eType";

/// Whether a feature is expanded into child nodes by the builder
pub fn is_containment_feature(feature: &str) -> bool {
    feature == ETYPE_FEATURE || LIST_FEATURES.contains(&feature)
}

/// Discriminator injected for relationships that share the shape of a
/// first-class element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticTag {
    SuperType,
    Exception,
    EnumLiteral,
    Operation,
}

impl SyntheticTag {
    /// Tag applied to elements found under a containment feature
    pub fn for_feature(feature: &str) -> Option<Self> {
        match feature {
            "eSuperTypes" => Some(SyntheticTag::SuperType),
            "eExceptions" => Some(SyntheticTag::Exception),
            "eLiterals" => Some(SyntheticTag::EnumLiteral),
            "eOperations" => Some(SyntheticTag::Operation),
            _ => None,
        }
    }

    /// Payload field the tag is written to
    pub fn field(&self) -> &'static str {
        match self {
            SyntheticTag::Operation => ECLASS_FIELD,
            _ => TYPE_FIELD,
        }
    }

    /// Value written to [`field`](Self::field)
    pub fn value(&self) -> &'static str {
        match self {
            SyntheticTag::SuperType => "EGenericSuperType",
            SyntheticTag::Exception => "EException",
            SyntheticTag::EnumLiteral => "EEnumLiteral",
            SyntheticTag::Operation => EOPERATION,
        }
    }
}

/// Classification of a payload, used for labels, icons and schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcoreType {
    Package,
    Class,
    DataType,
    Enum,
    Attribute,
    Reference,
    Operation,
    EnumLiteral,
    GenericSuperType,
    Exception,
    /// Contained type reference (`{eClass, $ref}`)
    TypeRef,
    Unknown,
}

impl EcoreType {
    /// Classify a payload
    ///
    /// Synthetic discriminators win over `eClass`; a payload carrying both
    /// `eClass` and `$ref` is a type reference.
    pub fn of(payload: &Payload) -> Self {
        if let Some(tag) = payload.get(TYPE_FIELD).and_then(Value::as_str) {
            match tag {
                "EEnumLiteral" => return EcoreType::EnumLiteral,
                "EGenericSuperType" => return EcoreType::GenericSuperType,
                "EException" => return EcoreType::Exception,
                _ => {}
            }
        }
        if is_type_ref(payload) {
            return EcoreType::TypeRef;
        }
        match payload.get(ECLASS_FIELD).and_then(Value::as_str) {
            Some(EPACKAGE) => EcoreType::Package,
            Some(ECLASS) => EcoreType::Class,
            Some(EDATATYPE) => EcoreType::DataType,
            Some(EENUM) => EcoreType::Enum,
            Some(EATTRIBUTE) => EcoreType::Attribute,
            Some(EREFERENCE) => EcoreType::Reference,
            Some(EOPERATION) => EcoreType::Operation,
            _ => EcoreType::Unknown,
        }
    }

    /// Short type name, e.g. `EClass`
    pub fn name(&self) -> &'static str {
        match self {
            EcoreType::Package => "EPackage",
            EcoreType::Class => "EClass",
            EcoreType::DataType => "EDataType",
            EcoreType::Enum => "EEnum",
            EcoreType::Attribute => "EAttribute",
            EcoreType::Reference => "EReference",
            EcoreType::Operation => "EOperation",
            EcoreType::EnumLiteral => "EEnumLiteral",
            EcoreType::GenericSuperType => "EGenericSuperType",
            EcoreType::Exception => "EException",
            EcoreType::TypeRef => "EType",
            EcoreType::Unknown => "",
        }
    }
}

/// A type reference carries both `eClass` and `$ref`
pub fn is_type_ref(payload: &Payload) -> bool {
    payload.contains_key(ECLASS_FIELD) && payload.contains_key(REF_FIELD)
}

/// Short name of a type URI: the fragment after `#//`
pub fn type_name(type_uri: &str) -> &str {
    type_uri
        .split_once("#//")
        .map(|(_, name)| name)
        .unwrap_or(type_uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => panic!("test payload must be an object"),
        }
    }

    #[test]
    fn test_synthetic_tag_wins_over_eclass() {
        let p = payload(json!({"eClass": ECLASS, "$ref": "//Base", "type": "EGenericSuperType"}));
        assert_eq!(EcoreType::of(&p), EcoreType::GenericSuperType);
    }

    #[test]
    fn test_type_ref_detection() {
        let p = payload(json!({"eClass": EDATATYPE, "$ref": "//EString"}));
        assert_eq!(EcoreType::of(&p), EcoreType::TypeRef);
    }

    #[test]
    fn test_unknown_type() {
        let p = payload(json!({"name": "x"}));
        assert_eq!(EcoreType::of(&p), EcoreType::Unknown);
        assert_eq!(EcoreType::Unknown.name(), "");
    }

    #[test]
    fn test_type_name() {
        assert_eq!(type_name(ECLASS), "EClass");
        assert_eq!(type_name("plain"), "plain");
    }

    #[test]
    fn test_operation_tag_targets_eclass() {
        assert_eq!(SyntheticTag::Operation.field(), "eClass");
        assert_eq!(SyntheticTag::EnumLiteral.field(), "type");
        assert_eq!(SyntheticTag::for_feature("eClassifiers"), None);
    }
}
