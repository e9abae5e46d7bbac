//! Deserializable representation of an application descriptor file.
//!
//! The types mirror the JSON emitted by the dictionary extractor. Every field
//! outside `applicationName` is optional so a partially populated descriptor
//! still contributes whatever it does describe; unknown fields are ignored.

use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, Deserialize)]
/// One application's scripting surface as stored on disk.
pub struct Descriptor {
    #[serde(rename = "applicationName")]
    pub application_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub suites: Vec<Suite>,
    /// Flat command list written by older extractor versions.
    #[serde(default)]
    pub commands: Vec<Command>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Suite {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub commands: Vec<Command>,
    #[serde(default)]
    pub classes: Vec<Class>,
    #[serde(default)]
    pub enumerations: Vec<Enumeration>,
}

#[derive(Clone, Debug, Default, Deserialize)]
/// A scriptable command. `name` stays optional so a single malformed entry
/// can be skipped at registration time without rejecting the whole file.
pub struct Command {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub direct_parameter: Option<DirectParameter>,
}

impl Command {
    /// The extractor writes `"result": {}` for commands that return nothing.
    pub fn has_result(&self) -> bool {
        match &self.result {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub optional: Option<bool>,
    #[serde(default)]
    pub default: Option<Value>,
}

impl Parameter {
    /// `required` wins when present; otherwise the extractor's `optional`
    /// flag decides, and a bare parameter is required.
    pub fn is_required(&self) -> bool {
        self.required
            .unwrap_or_else(|| !self.optional.unwrap_or(false))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
/// The unlabeled object a command acts on (`open <file>`).
pub struct DirectParameter {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Class {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub plural: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Class {
    /// Explicit plural, ignoring the empty string the extractor writes when
    /// the dictionary omits one.
    pub fn explicit_plural(&self) -> Option<&str> {
        self.plural
            .as_deref()
            .map(str::trim)
            .filter(|plural| !plural.is_empty())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Property {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Enumeration {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub enumerators: Vec<Enumerator>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Enumerator {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Descriptor {
    /// Every command in declaration order: the flat legacy list first, then
    /// each suite in turn.
    pub fn all_commands(&self) -> impl Iterator<Item = &Command> {
        self.commands
            .iter()
            .chain(self.suites.iter().flat_map(|suite| suite.commands.iter()))
    }

    pub fn all_classes(&self) -> impl Iterator<Item = &Class> {
        self.suites.iter().flat_map(|suite| suite.classes.iter())
    }

    pub fn command_count(&self) -> usize {
        self.all_commands().count()
    }
}
