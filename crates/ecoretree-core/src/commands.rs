//! Edit commands and their wire form
//!
//! Commands travel as modelserver JSON objects discriminated by a `type` tag.
//! A command whose tag is missing or unknown is ambiguous: it is never
//! guessed, and the caller is expected to resynchronize instead.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::{Result, SyncError};
use crate::model::ecore::{ECLASS_FIELD, EPACKAGE};
use crate::model::Payload;

pub const COMMAND_ADD: &str = "add";
pub const COMMAND_REMOVE: &str = "remove";
pub const COMMAND_SET: &str = "set";
pub const COMMAND_COMPOUND: &str = "compound";

/// Reference to the element a command applies to
///
/// `$ref` is a base document locator followed by `#` and a `/`-delimited path
/// suffix, e.g. `file:/ws/library.ecore#//Book`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerReference {
    #[serde(rename = "$ref")]
    pub reference: String,
    #[serde(rename = "eClass", default, skip_serializing_if = "Option::is_none")]
    pub e_class: Option<String>,
}

impl OwnerReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            e_class: None,
        }
    }

    pub fn with_e_class(mut self, e_class: impl Into<String>) -> Self {
        self.e_class = Some(e_class.into());
        self
    }

    /// Reference to the element described by `payload`
    ///
    /// Uses the payload's `semanticUri` when present, `/` for a package and
    /// `//<name>` otherwise. The element's `eClass` is carried along.
    pub fn for_element(base: &str, payload: &Payload) -> Self {
        let fragment = match payload.get("semanticUri").and_then(Value::as_str) {
            Some(uri) => uri.to_string(),
            None if payload.get(ECLASS_FIELD).and_then(Value::as_str) == Some(EPACKAGE) => {
                "/".to_string()
            }
            None => format!(
                "//{}",
                payload.get("name").and_then(Value::as_str).unwrap_or_default()
            ),
        };
        let owner = Self::new(format!("{}#{}", base, fragment));
        match payload.get(ECLASS_FIELD).and_then(Value::as_str) {
            Some(e_class) => owner.with_e_class(e_class),
            None => owner,
        }
    }

    /// Document locator before `#`
    pub fn locator(&self) -> &str {
        self.reference
            .split_once('#')
            .map(|(locator, _)| locator)
            .unwrap_or(&self.reference)
    }

    /// Path suffix after `#`
    pub fn fragment(&self) -> Option<&str> {
        self.reference.split_once('#').map(|(_, fragment)| fragment)
    }
}

/// Base locator for owner references into a document
///
/// `file:///` is shortened to `file:/`, the form the model server emits.
pub fn owner_base(workspace_root: &str, document_id: &str) -> String {
    format!(
        "{}/{}",
        workspace_root.trim_end_matches('/'),
        document_id.trim_start_matches('/')
    )
    .replace("file:///", "file:/")
}

/// A single authoritative change
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Append elements to a containment list
    Add {
        owner: OwnerReference,
        feature: String,
        values: Vec<Payload>,
    },

    /// Remove list entries by position
    Remove {
        owner: OwnerReference,
        feature: String,
        indices: Vec<usize>,
    },

    /// Overwrite one field
    Set {
        owner: OwnerReference,
        feature: String,
        value: Value,
    },

    /// Apply contained commands in order
    Compound { commands: Vec<Command> },
}

/// Modelserver JSON shape shared by all command kinds
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCommand {
    #[serde(rename = "type", default)]
    type_tag: Option<String>,
    #[serde(default)]
    owner: Option<OwnerReference>,
    #[serde(default)]
    feature: Option<String>,
    #[serde(default)]
    data_values: Option<Vec<Value>>,
    #[serde(default)]
    objects_to_add: Option<Vec<Value>>,
    #[serde(default)]
    indices: Option<Vec<usize>>,
    #[serde(default)]
    commands: Option<Vec<Value>>,
}

fn unparseable(reason: impl Into<String>) -> SyncError {
    SyncError::UnparseableCommand {
        reason: reason.into(),
    }
}

impl TryFrom<WireCommand> for Command {
    type Error = SyncError;

    fn try_from(wire: WireCommand) -> Result<Self> {
        let tag = wire
            .type_tag
            .ok_or(SyncError::AmbiguousCommandType { type_tag: None })?;

        if tag == COMMAND_COMPOUND {
            let commands = wire
                .commands
                .ok_or_else(|| unparseable("compound command without 'commands'"))?
                .iter()
                .map(Command::from_wire)
                .collect::<Result<Vec<_>>>()?;
            return Ok(Command::Compound { commands });
        }

        if ![COMMAND_ADD, COMMAND_REMOVE, COMMAND_SET].contains(&tag.as_str()) {
            return Err(SyncError::AmbiguousCommandType {
                type_tag: Some(tag),
            });
        }

        let owner = wire
            .owner
            .ok_or_else(|| unparseable(format!("{} command without owner", tag)))?;
        let feature = wire
            .feature
            .ok_or_else(|| unparseable(format!("{} command without feature", tag)))?;

        match tag.as_str() {
            COMMAND_SET => {
                let value = wire
                    .data_values
                    .and_then(|values| values.into_iter().next())
                    .ok_or_else(|| unparseable("set command without a value"))?;
                Ok(Command::Set {
                    owner,
                    feature,
                    value,
                })
            }
            COMMAND_ADD => {
                let values = wire
                    .objects_to_add
                    .or(wire.data_values)
                    .ok_or_else(|| unparseable("add command without values"))?
                    .into_iter()
                    .map(|value| match value {
                        Value::Object(payload) => Ok(payload),
                        _ => Err(SyncError::ValueNotAnObject {
                            feature: feature.clone(),
                        }),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Command::Add {
                    owner,
                    feature,
                    values,
                })
            }
            _ => {
                let indices = wire
                    .indices
                    .ok_or_else(|| unparseable("remove command without indices"))?;
                Ok(Command::Remove {
                    owner,
                    feature,
                    indices,
                })
            }
        }
    }
}

impl Command {
    /// Decode a command from its wire form
    ///
    /// # Errors
    ///
    /// `AmbiguousCommandType` when a type tag is missing or unknown anywhere
    /// in the command, `UnparseableCommand` / `ValueNotAnObject` when the
    /// shape is wrong.
    pub fn from_wire(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(unparseable("command is not an object"));
        }
        let wire: WireCommand =
            serde_json::from_value(value.clone()).map_err(|e| unparseable(e.to_string()))?;
        Command::try_from(wire)
    }

    /// Encode the command in modelserver JSON
    pub fn to_wire(&self) -> Value {
        match self {
            Command::Add {
                owner,
                feature,
                values,
            } => json!({
                "type": COMMAND_ADD,
                "owner": owner,
                "feature": feature,
                "objectsToAdd": values,
            }),
            Command::Remove {
                owner,
                feature,
                indices,
            } => json!({
                "type": COMMAND_REMOVE,
                "owner": owner,
                "feature": feature,
                "indices": indices,
            }),
            Command::Set {
                owner,
                feature,
                value,
            } => json!({
                "type": COMMAND_SET,
                "owner": owner,
                "feature": feature,
                "dataValues": [value],
            }),
            Command::Compound { commands } => json!({
                "type": COMMAND_COMPOUND,
                "commands": commands.iter().map(Command::to_wire).collect::<Vec<_>>(),
            }),
        }
    }

    /// Wire type tag
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Add { .. } => COMMAND_ADD,
            Command::Remove { .. } => COMMAND_REMOVE,
            Command::Set { .. } => COMMAND_SET,
            Command::Compound { .. } => COMMAND_COMPOUND,
        }
    }

    pub fn owner(&self) -> Option<&OwnerReference> {
        match self {
            Command::Add { owner, .. } | Command::Remove { owner, .. } | Command::Set { owner, .. } => {
                Some(owner)
            }
            Command::Compound { .. } => None,
        }
    }

    pub fn feature(&self) -> Option<&str> {
        match self {
            Command::Add { feature, .. }
            | Command::Remove { feature, .. }
            | Command::Set { feature, .. } => Some(feature),
            Command::Compound { .. } => None,
        }
    }
}
