//! Content validation seam.
//!
//! Per-type field rules belong to the site, not to this crate. The gateway
//! only needs "valid + sanitized payload" or "invalid + field errors", which
//! is what [`ContentValidator`] expresses. [`StructuralValidator`] is the
//! default: it enforces document shape and scrubs strings, nothing more.

use crate::error::{FieldError, FolioError, Result};
use serde_json::{Map, Value};

/// Validates and sanitizes a raw payload for one content type.
pub trait ContentValidator: Send + Sync {
    /// Returns the sanitized payload, or `FolioError::Validation` carrying
    /// every field-level problem found.
    fn sanitize_and_validate(&self, content_type: &str, raw: Value) -> Result<Value>;
}

/// Maximum nesting accepted by [`StructuralValidator`] unless overridden.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Shape-only validator.
///
/// - the document root must be an object or an array
/// - object keys must be non-empty
/// - nesting is capped at `max_depth`
/// - string leaves are trimmed and stripped of control characters other
///   than `\n` and `\t`
#[derive(Debug, Clone)]
pub struct StructuralValidator {
    max_depth: usize,
}

impl Default for StructuralValidator {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl StructuralValidator {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    fn walk(&self, value: Value, path: &str, depth: usize, errors: &mut Vec<FieldError>) -> Value {
        if depth > self.max_depth {
            errors.push(FieldError::new(
                path,
                format!("nesting deeper than {} levels", self.max_depth),
            ));
            return Value::Null;
        }

        match value {
            Value::String(s) => Value::String(scrub(&s)),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| self.walk(item, &format!("{}[{}]", path, i), depth + 1, errors))
                    .collect(),
            ),
            Value::Object(fields) => {
                let mut out = Map::with_capacity(fields.len());
                for (key, item) in fields {
                    let child_path = format!("{}.{}", path, key);
                    if key.trim().is_empty() {
                        errors.push(FieldError::new(&child_path, "empty field name"));
                        continue;
                    }
                    let item = self.walk(item, &child_path, depth + 1, errors);
                    out.insert(key, item);
                }
                Value::Object(out)
            }
            other => other,
        }
    }
}

impl ContentValidator for StructuralValidator {
    fn sanitize_and_validate(&self, content_type: &str, raw: Value) -> Result<Value> {
        if !(raw.is_object() || raw.is_array()) {
            return Err(FolioError::validation(vec![FieldError::new(
                "$",
                "content must be a JSON object or array",
            )]));
        }

        let mut errors = Vec::new();
        let sanitized = self.walk(raw, "$", 0, &mut errors);

        if errors.is_empty() {
            Ok(sanitized)
        } else {
            tracing::debug!(
                content_type,
                error_count = errors.len(),
                "Payload rejected by structural validation"
            );
            Err(FolioError::validation(errors))
        }
    }
}

fn scrub(s: &str) -> String {
    let kept: String = s
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    kept.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_and_scrubs_strings() {
        let validator = StructuralValidator::default();
        let out = validator
            .sanitize_and_validate(
                "footer",
                json!({"copyright": "  2024\u{0007} ", "lines": ["a\tb", " c\n"]}),
            )
            .unwrap();
        assert_eq!(out, json!({"copyright": "2024", "lines": ["a\tb", "c"]}));
    }

    #[test]
    fn test_rejects_scalar_root() {
        let validator = StructuralValidator::default();
        let err = validator
            .sanitize_and_validate("footer", json!("just a string"))
            .unwrap_err();
        match err {
            FolioError::Validation(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "$");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_reports_every_bad_field() {
        let validator = StructuralValidator::default();
        let err = validator
            .sanitize_and_validate("team", json!({"members": [{"": "x"}, {" ": "y"}]}))
            .unwrap_err();
        match err {
            FolioError::Validation(fields) => {
                let paths: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(paths, vec!["$.members[0].", "$.members[1]. "]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_depth_limit() {
        let validator = StructuralValidator::new(2);
        assert!(validator.sanitize_and_validate("faq", json!({"a": {"b": 1}})).is_ok());
        assert!(validator
            .sanitize_and_validate("faq", json!({"a": {"b": {"c": 1}}}))
            .is_err());
    }
}
