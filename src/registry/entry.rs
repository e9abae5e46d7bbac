//! Compiled registry entries.

use crate::descriptor::Command;
use crate::naming::{FunctionId, ParamNameMap, build_function_id};
use anyhow::{Result, anyhow};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize)]
/// A declared parameter under its sanitized identifier.
pub struct ParamSpec {
    pub name: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// One command compiled from a descriptor.
pub struct CommandEntry {
    pub app: String,
    pub command: String,
    pub function_id: FunctionId,
    pub description: String,
    /// Declared parameters, required ones first, each group in descriptor order.
    pub params: Vec<ParamSpec>,
    pub param_map: ParamNameMap,
    pub has_result: bool,
    /// `Some(optional)` when the command takes an unlabeled direct parameter.
    pub direct_parameter: Option<bool>,
}

/// Identifier reserved for a command's unlabeled direct parameter.
pub const DIRECT_PARAMETER: &str = "direct_parameter";

impl CommandEntry {
    /// Compile a descriptor command, failing when it lacks a name.
    pub fn compile(app: &str, command: &Command) -> Result<Self> {
        let name = command
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| anyhow!("command is missing its name"))?;

        let mut param_map = ParamNameMap::new();
        let mut required = Vec::new();
        let mut optional = Vec::new();
        for (idx, param) in command.parameters.iter().enumerate() {
            let raw = param
                .name
                .as_deref()
                .filter(|raw| !raw.trim().is_empty())
                .ok_or_else(|| anyhow!("parameter #{} of '{name}' is missing its name", idx + 1))?;
            let identifier = param_map.insert_avoiding(raw, &[DIRECT_PARAMETER]);
            let spec = ParamSpec {
                name: identifier,
                required: param.is_required(),
                default: param.default.clone().filter(|value| !value.is_null()),
                kind: param.kind.clone().filter(|kind| !kind.is_empty()),
            };
            if spec.required {
                required.push(spec);
            } else {
                optional.push(spec);
            }
        }
        required.extend(optional);

        Ok(Self {
            app: app.to_string(),
            command: name.to_string(),
            function_id: build_function_id(app, name),
            description: command
                .description
                .clone()
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| "Execute AppleScript command".to_string()),
            params: required,
            param_map,
            has_result: command.has_result(),
            direct_parameter: command.direct_parameter.as_ref().map(|direct| direct.optional),
        })
    }

    /// Tool description shown to callers.
    pub fn tool_description(&self) -> String {
        format!(
            "{}\n\nAppleScript command for {}: {}",
            self.description, self.app, self.command
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// A zero-argument resource query derived from a descriptor's classes.
pub struct AccessorEntry {
    pub app: String,
    pub function_id: FunctionId,
    pub query: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// Answer to a `describe_command` lookup.
pub struct CommandInfo {
    pub app_name: String,
    pub command_name: String,
    pub description: String,
    pub function_name: String,
}
