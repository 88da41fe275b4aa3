//! Structured-output handling: fenced-block extraction, quality-metric
//! normalization, and JSON Schema validation.

use gtmforge_utils::error::LlmClientError;
use serde_json::Value;

/// The four quality metrics models routinely omit or null out. Missing or
/// non-numeric values are coerced to 0.0 rather than failing validation.
const QUALITY_METRIC_KEYS: [&str; 4] = [
    "content_completeness",
    "information_specificity",
    "data_recency",
    "marketing_maturity",
];

/// Extract the JSON payload from a model response.
///
/// Models often wrap JSON in a fenced ```json block despite instructions;
/// when one is present the first block's contents are used, otherwise the
/// whole text is taken as-is.
pub(crate) fn extract_json_payload(text: &str) -> &str {
    if let Some(after_fence) = text.split_once("```json").map(|(_, rest)| rest) {
        let inner = after_fence
            .split_once("```")
            .map_or(after_fence, |(inner, _)| inner);
        inner.trim()
    } else {
        text.trim()
    }
}

/// Coerce the quality metrics inside a `data_quality_metrics` object to
/// floats, defaulting missing, null, or unparsable values to 0.0. A payload
/// without a `data_quality_metrics` object is left untouched.
pub(crate) fn normalize_quality_metrics(payload: &mut Value) {
    let Some(metrics) = payload
        .get_mut("data_quality_metrics")
        .and_then(Value::as_object_mut)
    else {
        return;
    };

    for key in QUALITY_METRIC_KEYS {
        let coerced = match metrics.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        };
        metrics.insert(key.to_string(), coerce_to_json_f64(coerced));
    }
}

fn coerce_to_json_f64(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::from(0.0), Value::Number)
}

/// Parse and validate a model response against a JSON Schema.
///
/// # Errors
///
/// Returns `LlmClientError::MalformedOutput` carrying the raw text and, for
/// schema violations, the offending instance paths.
pub(crate) fn parse_and_validate(text: &str, schema: &Value) -> Result<Value, LlmClientError> {
    let payload = extract_json_payload(text);

    let mut value: Value =
        serde_json::from_str(payload).map_err(|e| LlmClientError::MalformedOutput {
            reason: format!("invalid JSON: {e}"),
            raw: text.to_string(),
            fields: Vec::new(),
        })?;

    normalize_quality_metrics(&mut value);

    let validator =
        jsonschema::validator_for(schema).map_err(|e| LlmClientError::MalformedOutput {
            reason: format!("invalid response schema: {e}"),
            raw: text.to_string(),
            fields: Vec::new(),
        })?;

    let fields: Vec<String> = validator
        .iter_errors(&value)
        .map(|e| e.instance_path().to_string())
        .collect();

    if fields.is_empty() {
        Ok(value)
    } else {
        Err(LlmClientError::MalformedOutput {
            reason: "schema validation failed".to_string(),
            raw: text.to_string(),
            fields,
        })
    }
}
