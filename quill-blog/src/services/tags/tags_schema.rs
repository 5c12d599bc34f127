use quill_core::QuillError;
use serde_json::Value;
use validator::Validate;

use crate::utils::validator::validate;

use super::tags_shared::normalize_name;

pub const NAME_REQUIRED: &str = "Tag name is required";

#[derive(Debug, Validate)]
pub struct TagInput {
    #[validate(length(min = 1, max = 50, message = "Tag name must be between 1 and 50 characters"))]
    pub name: String,
}

impl TagInput {
    /// Reads and normalises `name` from a request body.
    pub fn from_body(data: &Value) -> Result<Self, QuillError> {
        let name = data
            .get("name")
            .and_then(|v| v.as_str())
            .map(normalize_name)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                QuillError::validation(NAME_REQUIRED)
                    .with_errors(serde_json::json!({"name": [NAME_REQUIRED]}))
            })?;

        let input = Self { name };
        validate(&input, NAME_REQUIRED)?;
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trims_and_lowercases() {
        let input = TagInput::from_body(&json!({"name": "  TechNology "})).unwrap();
        assert_eq!(input.name, "technology");
    }

    #[test]
    fn missing_or_blank_name_is_required() {
        for body in [json!({}), json!({"name": "   "}), json!({"name": 5})] {
            let err = TagInput::from_body(&body).unwrap_err();
            assert_eq!(err.code(), 400);
            assert_eq!(err.message, NAME_REQUIRED);
        }
    }

    #[test]
    fn length_is_counted_after_trimming() {
        let fifty = "a".repeat(50);
        assert!(TagInput::from_body(&json!({"name": format!("  {fifty}  ")})).is_ok());

        let err = TagInput::from_body(&json!({"name": "a".repeat(51)})).unwrap_err();
        assert_eq!(err.code(), 400);
        assert!(err.errors.unwrap()["name"].is_array());
    }
}
