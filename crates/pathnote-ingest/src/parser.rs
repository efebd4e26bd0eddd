//! Validation of raw extractor output into a flat label map.
//!
//! The extractor contract is one JSON object on stdout whose values are
//! scalars. Anything else is rejected as a whole; there is no partial
//! success.

use serde_json::Value as JsonValue;

use pathnote_core::{Error, FlatFieldMap, Result};

/// Key the extractor uses to report its own failure while exiting 0.
const EXTRACTOR_ERROR_KEY: &str = "error";

/// Parse raw extractor stdout into a [`FlatFieldMap`].
///
/// - empty or whitespace-only output is `EmptyOutput`
/// - invalid JSON, a non-object, a nested array/object value, or an
///   `{"error": ..}` payload is `MalformedOutput`
/// - string values are kept as-is, numbers and booleans are stringified,
///   `null` values are dropped
///
/// Both errors carry the untrimmed raw output for diagnosis.
pub fn parse_flat_fields(raw: &str) -> Result<FlatFieldMap> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyOutput {
            raw_output: raw.to_string(),
        });
    }

    let malformed = |reason: String| Error::MalformedOutput {
        reason,
        raw_output: raw.to_string(),
    };

    let value: JsonValue = serde_json::from_str(trimmed)
        .map_err(|e| malformed(format!("output is not valid JSON: {}", e)))?;

    let object = match value {
        JsonValue::Object(object) => object,
        other => {
            return Err(malformed(format!(
                "expected a JSON object, found {}",
                json_type(&other)
            )))
        }
    };

    if let Some(reported) = object.get(EXTRACTOR_ERROR_KEY) {
        let message = match reported {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(malformed(format!("extractor reported an error: {}", message)));
    }

    let mut fields = FlatFieldMap::new();
    for (label, value) in object {
        let text = match value {
            JsonValue::String(s) => s,
            JsonValue::Number(n) => n.to_string(),
            JsonValue::Bool(b) => b.to_string(),
            JsonValue::Null => continue,
            nested @ (JsonValue::Array(_) | JsonValue::Object(_)) => {
                return Err(malformed(format!(
                    "field '{}' has a nested {} value",
                    label,
                    json_type(&nested)
                )))
            }
        };
        fields.insert(label, text);
    }

    Ok(fields)
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
