//! JSON Schema helpers shared by plan normalization and validation.
//!
//! Two deliberately distinct concerns share this module: default-filling
//! produces *data* (so templates always receive their declared fields),
//! while [`validate_data`] checks conformance through a single shared
//! jsonschema primitive. Null values count as missing, mirroring how
//! model-produced data omits fields.

use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Default filling
// ---------------------------------------------------------------------------

/// Type-appropriate zero value for a JSON Schema `type` string.
pub fn zero_value_for_type(ty: Option<&str>) -> Value {
    match ty {
        Some("boolean") => Value::Bool(false),
        Some("number") | Some("integer") => Value::from(0),
        Some("array") => Value::Array(Vec::new()),
        Some("object") => Value::Object(Map::new()),
        _ => Value::String(String::new()),
    }
}

/// Fill missing fields in `data` from the schema's declared defaults.
///
/// For every property declared by the schema and absent (or null) in the
/// data, inserts the property's `default` if declared, else a
/// type-appropriate zero value. Afterwards every `required` property
/// still missing is filled the same way, so schema-required fields never
/// reach the renderer undefined. Non-object data is replaced with an
/// empty object first.
pub fn fill_schema_defaults(schema: &Value, data: &mut Value) {
    if !data.is_object() {
        *data = Value::Object(Map::new());
    }
    let Value::Object(obj) = data else {
        return;
    };

    let properties = schema.get("properties").and_then(|p| p.as_object());

    if let Some(props) = properties {
        for (name, prop_schema) in props {
            if is_missing(obj.get(name)) {
                obj.insert(name.clone(), default_for_property(prop_schema));
            }
        }
    }

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for name in required.iter().filter_map(|v| v.as_str()) {
            if is_missing(obj.get(name)) {
                let prop_schema = properties.and_then(|p| p.get(name));
                let value = prop_schema
                    .map(default_for_property)
                    .unwrap_or_else(|| Value::String(String::new()));
                obj.insert(name.to_string(), value);
            }
        }
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn default_for_property(prop_schema: &Value) -> Value {
    if let Some(default) = prop_schema.get("default") {
        default.clone()
    } else {
        zero_value_for_type(prop_schema.get("type").and_then(|t| t.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate `data` against `schema`, collecting every violation into one
/// message. A malformed schema is itself a validation failure.
pub fn validate_data(schema: &Value, data: &Value) -> Result<(), String> {
    let validator =
        jsonschema::validator_for(schema).map_err(|e| format!("Schema is not valid: {e}"))?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| format!("{}: {e}", e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
