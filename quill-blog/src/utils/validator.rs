use quill_core::QuillError;
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

/// `{field: [message, ...]}` from validator output.
pub fn field_errors(errors: &ValidationErrors) -> Value {
    let mut out = Map::new();
    for (field, errs) in errors.field_errors() {
        let messages = errs
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .map(Value::String)
            .collect();
        out.insert(field.to_string(), Value::Array(messages));
    }
    Value::Object(out)
}

/// Runs `validate()` and turns failures into a ValidationError carrying the
/// field messages; the first message becomes the error text.
pub fn validate<T: Validate>(value: &T, fallback: &str) -> Result<(), QuillError> {
    value.validate().map_err(|errors| {
        let details = field_errors(&errors);
        let message = details
            .as_object()
            .and_then(|m| m.values().next())
            .and_then(|v| v.get(0))
            .and_then(|v| v.as_str())
            .unwrap_or(fallback)
            .to_string();
        QuillError::validation(message).with_errors(details)
    })
}

/// Trimmed string, `None` when absent or blank.
pub fn non_empty(v: Option<&str>) -> Option<String> {
    v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
