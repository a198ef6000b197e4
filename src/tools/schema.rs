//! Argument validation against a tool's declared JSON schema.
//!
//! Only the subset of JSON Schema the tools actually declare is understood:
//! `properties` with a `type` (`string`, `integer`, `number`, `boolean`,
//! `array`, `object`), optional `default`, `minimum` and `maximum`, plus the
//! top-level `required` list. Models frequently quote numbers, so numeric
//! and boolean strings are coerced to the declared type.

use serde_json::{Map, Number, Value};

use super::ToolArgs;
use crate::error::{DocentError, Result};

/// Check `args` against `schema`, fill declared defaults, and wrap the result.
///
/// Keys the schema does not declare are passed through untouched. A `null`
/// value is treated as absent.
pub fn validate_arguments(schema: &Value, args: Map<String, Value>) -> Result<ToolArgs> {
    let empty = Map::new();
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let mut out: Map<String, Value> = args.into_iter().filter(|(_, v)| !v.is_null()).collect();

    for (name, prop) in properties {
        match out.remove(name) {
            Some(value) => {
                let value = check_property(name, prop, value)?;
                out.insert(name.clone(), value);
            }
            None => {
                if let Some(default) = prop.get("default") {
                    out.insert(name.clone(), default.clone());
                }
            }
        }
    }

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !out.contains_key(field) {
                return Err(DocentError::InvalidArguments(format!(
                    "missing required argument '{}'",
                    field
                )));
            }
        }
    }

    Ok(ToolArgs::new(out))
}

fn check_property(name: &str, prop: &Value, value: Value) -> Result<Value> {
    let Some(expected) = prop.get("type").and_then(Value::as_str) else {
        return Ok(value);
    };

    let value = coerce(expected, value).ok_or_else(|| {
        DocentError::InvalidArguments(format!("argument '{}' must be {}", name, article(expected)))
    })?;

    if let Some(n) = value.as_f64() {
        if let Some(min) = prop.get("minimum").and_then(Value::as_f64) {
            if n < min {
                return Err(DocentError::InvalidArguments(format!(
                    "argument '{}' must be at least {}",
                    name, min
                )));
            }
        }
        if let Some(max) = prop.get("maximum").and_then(Value::as_f64) {
            if n > max {
                return Err(DocentError::InvalidArguments(format!(
                    "argument '{}' must be at most {}",
                    name, max
                )));
            }
        }
    }

    Ok(value)
}

/// Convert `value` to the JSON type named by `expected`, or `None` if it
/// cannot represent one.
fn coerce(expected: &str, value: Value) -> Option<Value> {
    match (expected, value) {
        ("string", v @ Value::String(_)) => Some(v),
        ("string", Value::Number(n)) => Some(Value::String(n.to_string())),

        ("integer", Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                Some(Value::Number(n))
            } else {
                // 10.0 is an acceptable integer, 10.5 is not
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| Value::Number(Number::from(f as i64)))
            }
        }
        ("integer", Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),

        ("number", v @ Value::Number(_)) => Some(v),
        ("number", Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),

        ("boolean", v @ Value::Bool(_)) => Some(v),
        ("boolean", Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },

        ("array", v @ Value::Array(_)) => Some(v),
        ("object", v @ Value::Object(_)) => Some(v),

        // Unknown type names are not enforced
        (other, v) if !matches!(
            other,
            "string" | "integer" | "number" | "boolean" | "array" | "object"
        ) =>
        {
            Some(v)
        }
        _ => None,
    }
}

fn article(type_name: &str) -> String {
    match type_name {
        "integer" | "array" | "object" => format!("an {}", type_name),
        _ => format!("a {}", type_name),
    }
}
