//! Invocation synthesis: structured call requests to AppleScript text.
//!
//! Every script is a single statement wrapped in a `tell application` block.
//! Parameter names are emitted bare (never quoted) and string values are
//! quoted with `"` and `\` escaped.

pub mod executor;

pub use executor::{CommandSpec, OsascriptExecutor, ScriptExecutor, ScriptOutput};

use crate::error::BridgeError;
use crate::naming::{ParamNameMap, SELF_MARKER};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Ordered parameter map; iteration order is insertion order.
pub type Parameters = Map<String, Value>;

#[derive(Clone, Debug, Default, PartialEq)]
/// Everything needed to render one statement.
pub struct Invocation<'a> {
    pub app: &'a str,
    /// Command name or raw resource path.
    pub target: &'a str,
    /// Unlabeled direct parameter, emitted right after the target.
    pub direct: Option<&'a Value>,
    pub params: Vec<(&'a str, &'a Value)>,
    pub param_map: Option<&'a ParamNameMap>,
}

impl Invocation<'_> {
    /// Render the full `tell … end tell` script.
    pub fn render(&self) -> String {
        let mut statement = String::from(self.target);
        if let Some(direct) = self.direct {
            statement.push(' ');
            statement.push_str(&format_value(direct));
        }
        for (key, value) in &self.params {
            if *key == SELF_MARKER {
                continue;
            }
            let name = match self.param_map {
                Some(map) => map.resolve(key),
                None => key,
            };
            statement.push_str(&parameter_clause(name, value));
        }

        [
            format!("tell application {}", quote(self.app)),
            statement,
            "end tell".to_string(),
        ]
        .join("\n")
    }
}

/// Render a script for `command_or_path` with `parameters` in iteration order.
///
/// Wire names come from `param_map`; keys it does not know are used as-is.
pub fn synthesize(
    app: &str,
    command_or_path: &str,
    parameters: &Parameters,
    param_map: &ParamNameMap,
) -> String {
    Invocation {
        app,
        target: command_or_path,
        direct: None,
        params: parameters.iter().map(|(k, v)| (k.as_str(), v)).collect(),
        param_map: Some(param_map),
    }
    .render()
}

/// ` with <name> <value>`, without doubling a leading `with` keyword.
pub fn parameter_clause(name: &str, value: &Value) -> String {
    let formatted = format_value(value);
    if starts_with_with_keyword(name) {
        format!(" {name} {formatted}")
    } else {
        format!(" with {name} {formatted}")
    }
}

fn starts_with_with_keyword(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    lowered == "with" || lowered.starts_with("with ") || lowered.starts_with("with_")
}

/// AppleScript literal for a JSON value.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::String(text) => quote(text),
        Value::Object(record) => {
            let fields: Vec<String> = record
                .iter()
                .map(|(key, value)| format!("{key}:{}", format_value(value)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("{{{}}}", items.join(", "))
        }
        Value::Null => "missing value".to_string(),
        Value::Number(number) => number.to_string(),
    }
}

/// Double-quoted AppleScript string literal.
pub fn quote(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Run a rendered script and turn the output into the bridge's result shape.
///
/// Never panics and never lets a spawn failure escape as anything other than
/// `ExecutionFailed`.
pub fn execute(executor: &dyn ScriptExecutor, script: &str) -> Result<String, BridgeError> {
    debug!(script, "executing AppleScript");
    match executor.run(script) {
        Ok(output) if output.success() => Ok(output.stdout.trim().to_string()),
        Ok(output) => {
            warn!(exit_code = output.exit_code, stderr = %output.stderr.trim(), "AppleScript error");
            Err(BridgeError::execution_failed(&output.stderr))
        }
        Err(err) => {
            let message = format!("{err:#}");
            warn!(error = %message, "unable to run AppleScript");
            Err(BridgeError::execution_failed(&message))
        }
    }
}
