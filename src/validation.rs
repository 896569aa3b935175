// Argument guards used at the public entry points.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, RuleError};

/// Returns the value if present, otherwise fails with an
/// `InvalidArgument` error naming the offending parameter.
pub fn check_not_null<T>(argument: Option<T>, argument_name: &str) -> Result<T> {
    argument.ok_or_else(|| {
        RuleError::InvalidArgument(format!("The {} must not be null", argument_name))
    })
}

/// Parses a JSON configuration document that must be an object.
///
/// Structs with defaulted fields would otherwise also accept a JSON array
/// and read it positionally.
pub(crate) fn parse_json_object<T: DeserializeOwned>(json: &str) -> Result<T> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| RuleError::ConfigParse(e.to_string()))?;
    if !value.is_object() {
        return Err(RuleError::ConfigParse(format!(
            "Expected a JSON object, found {}",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| RuleError::ConfigParse(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
