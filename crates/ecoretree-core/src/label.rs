//! Label resolver trait and the default Ecore implementation
//!
//! The tree never stores authoritative names: every node's display name and
//! icon token are derived from its payload through a `LabelResolver`, and are
//! recomputed whenever the payload changes.

use serde_json::Value;

use crate::model::ecore::{self, EcoreType, REF_FIELD};
use crate::model::Payload;

/// Derives display names and icon tokens from payloads
///
/// The payload handed in is the node's label view: its own fields, the
/// injected discriminator, and its reassembled containments.
pub trait LabelResolver: Send + Sync {
    /// Display name shown for the element
    fn display_name(&self, payload: &Payload) -> String;

    /// Icon token for the element
    fn icon(&self, payload: &Payload) -> String;
}

/// Icon token used when the element type is not recognised
pub const UNKNOWN_ICON: &str = "fa fa-question-circle";

/// Label resolver for Ecore metamodel documents
///
/// # Example
/// ```
/// use ecoretree_core::label::{EcoreLabelResolver, LabelResolver};
/// use serde_json::json;
///
/// let payload = json!({
///     "eClass": "http://www.eclipse.org/emf/2002/Ecore#//EDataType",
///     "name": "Date",
///     "instanceClassName": "java.util.Date"
/// });
/// let labels = EcoreLabelResolver;
/// assert_eq!(labels.display_name(payload.as_object().unwrap()), "Date [java.util.Date]");
/// assert_eq!(labels.icon(payload.as_object().unwrap()), "ecoreimg edatatype");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EcoreLabelResolver;

impl EcoreLabelResolver {
    /// Strip the `//` that prefixes a local fragment
    fn to_name(fragment: &str) -> String {
        fragment.get(2..).unwrap_or_default().to_string()
    }

    /// Name of a referenced type, local (`//X`) or cross-document (`uri#//X`)
    fn ref_name(reference: &str) -> String {
        if reference.starts_with("//") {
            return Self::to_name(reference);
        }
        match reference.split_once('#') {
            Some((_, fragment)) => Self::to_name(fragment),
            None => String::new(),
        }
    }

    fn str_field<'a>(payload: &'a Payload, field: &str) -> &'a str {
        payload.get(field).and_then(Value::as_str).unwrap_or_default()
    }

    fn is_set(payload: &Payload, field: &str) -> bool {
        match payload.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => n.as_f64() != Some(0.0),
            Some(_) => true,
        }
    }
}

impl LabelResolver for EcoreLabelResolver {
    fn display_name(&self, payload: &Payload) -> String {
        let name = Self::str_field(payload, "name");

        if let Some(Value::Array(super_types)) = payload.get("eSuperTypes") {
            let targets: Vec<String> = super_types
                .iter()
                .filter_map(|t| t.get(REF_FIELD).and_then(Value::as_str))
                .map(Self::to_name)
                .collect();
            if targets.is_empty() {
                return name.to_string();
            }
            return format!("{} \u{2192} {}", name, targets.join(", "));
        }

        match EcoreType::of(payload) {
            EcoreType::EnumLiteral => {
                let value = match payload.get("value") {
                    Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
                    Some(Value::String(s)) if !s.is_empty() => s.clone(),
                    _ => "0".to_string(),
                };
                return format!("{} = {}", name, value);
            }
            EcoreType::GenericSuperType | EcoreType::Exception => {
                return Self::to_name(Self::str_field(payload, REF_FIELD));
            }
            _ => {}
        }

        if let Some(reference) = payload
            .get(ecore::ETYPE_FEATURE)
            .and_then(|t| t.get(REF_FIELD))
            .and_then(Value::as_str)
        {
            return format!("{} : {}", name, Self::ref_name(reference));
        }

        match EcoreType::of(payload) {
            EcoreType::TypeRef => Self::ref_name(Self::str_field(payload, REF_FIELD)),
            EcoreType::DataType => format!(
                "{} [{}]",
                name,
                Self::str_field(payload, "instanceClassName")
            ),
            _ => name.to_string(),
        }
    }

    fn icon(&self, payload: &Payload) -> String {
        let token = match EcoreType::of(payload) {
            EcoreType::EnumLiteral => Some("eenumliteral"),
            EcoreType::GenericSuperType => Some("egenericsupertype"),
            EcoreType::Exception => None,
            EcoreType::TypeRef => Some("egenericelementtype"),
            _ if Self::is_set(payload, "abstract") => Some("eclassabstract"),
            _ if Self::is_set(payload, "interface") => Some("eclassinterface"),
            EcoreType::Package => Some("epackage"),
            EcoreType::Class => Some("eclass"),
            EcoreType::Enum => Some("eenum"),
            EcoreType::DataType => Some("edatatype"),
            EcoreType::Reference => Some("ereference"),
            EcoreType::Attribute => Some("eattribute"),
            _ => None,
        };
        match token {
            Some(token) => format!("ecoreimg {}", token),
            None => UNKNOWN_ICON.to_string(),
        }
    }
}
