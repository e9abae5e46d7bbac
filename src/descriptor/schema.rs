//! Structural validation of descriptor files against the bundled JSON Schema.
//!
//! The schema only pins down shapes (strings, arrays, objects) and the
//! presence of `applicationName`; semantic checks against the real
//! application are out of scope.

use anyhow::{Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::sync::OnceLock;

const DESCRIPTOR_SCHEMA: &str = include_str!("../../schema/descriptor.schema.json");

static SCHEMA_VALUE: OnceLock<Value> = OnceLock::new();
static COMPILED: OnceLock<std::result::Result<JSONSchema, String>> = OnceLock::new();

fn compiled_schema() -> Result<&'static JSONSchema> {
    COMPILED
        .get_or_init(|| {
            let raw = SCHEMA_VALUE.get_or_init(|| {
                serde_json::from_str(DESCRIPTOR_SCHEMA).unwrap_or(Value::Bool(true))
            });
            JSONSchema::compile(raw).map_err(|err| err.to_string())
        })
        .as_ref()
        .map_err(|err| anyhow!("compiling descriptor schema: {err}"))
}

/// Validate a parsed descriptor document, joining every violation into one
/// error so the log line names all of them.
pub fn validate_descriptor_value(value: &Value) -> Result<()> {
    let schema = compiled_schema()?;
    if let Err(errors) = schema.validate(value) {
        let details = errors
            .map(|err| {
                let path = err.instance_path.to_string();
                if path.is_empty() {
                    err.to_string()
                } else {
                    format!("{path}: {err}")
                }
            })
            .collect::<Vec<_>>()
            .join("; ");
        bail!("descriptor failed schema validation: {details}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_minimal_and_rich_descriptors() {
        validate_descriptor_value(&json!({"applicationName": "Notes"})).expect("minimal");
        validate_descriptor_value(&json!({
            "applicationName": "Notes",
            "suites": [{
                "name": "Notes Suite",
                "commands": [{"description": "nameless commands are skipped later"}],
                "classes": [{"name": "note", "properties": [{"name": "body"}]}]
            }]
        }))
        .expect("rich");
    }

    #[test]
    fn null_optional_fields_are_left_to_registration() {
        validate_descriptor_value(&json!({
            "applicationName": "Notes",
            "version": null,
            "suites": [{
                "name": null,
                "commands": [
                    {"name": null},
                    {"name": "show", "description": null,
                     "parameters": [{"name": "in", "type": null, "required": null}]}
                ],
                "classes": [{"name": "note", "plural": null, "properties": [{"name": "body", "access": null}]}]
            }]
        }))
        .expect("nulls accepted");
    }

    #[test]
    fn rejects_missing_name_and_wrong_shapes() {
        let missing = validate_descriptor_value(&json!({"suites": []})).unwrap_err();
        assert!(missing.to_string().contains("applicationName"));

        let wrong = validate_descriptor_value(&json!({
            "applicationName": "Notes",
            "suites": [{"commands": [{"name": "show", "parameters": "nope"}]}]
        }))
        .unwrap_err();
        assert!(wrong.to_string().contains("/suites/0/commands/0/parameters"));

        assert!(validate_descriptor_value(&json!({"applicationName": ""})).is_err());
    }
}
