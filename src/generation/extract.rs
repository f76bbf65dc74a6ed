// JSON extraction from free-form model output
//
// Models are asked for bare JSON but regularly wrap it in prose or markdown
// fences. The extractor tries a strict parse first, then falls back to the
// first brace-balanced `{...}` region.

use serde_json::{Map, Value};

use crate::errors::ExtractError;

/// Locate and parse the JSON object embedded in `raw`.
///
/// A top-level array is unwrapped to its first element; an empty array is
/// `EmptyList`. A list is never returned as the final object.
pub fn extract(raw: &str) -> Result<Map<String, Value>, ExtractError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ExtractError::EmptyResponse);
    }

    // Strict JSON-only output parses directly
    let value = match serde_json::from_str::<Value>(text) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
        _ => {
            let candidate = find_balanced_object(text).ok_or(ExtractError::NoJsonFound)?;
            serde_json::from_str::<Value>(candidate)
                .map_err(|e| ExtractError::MalformedJson(e.to_string()))?
        }
    };

    into_object(value)
}

fn into_object(value: Value) -> Result<Map<String, Value>, ExtractError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Array(items) => match items.into_iter().next() {
            Some(Value::Object(map)) => Ok(map),
            Some(other) => Err(ExtractError::MalformedJson(format!(
                "expected an object as first array element, got {}",
                type_name(&other)
            ))),
            None => Err(ExtractError::EmptyList),
        },
        other => Err(ExtractError::MalformedJson(format!(
            "expected an object, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Return the `{...}` substring opened by the first `{` in `text`, if its
/// braces balance.
///
/// Braces inside JSON string literals are ignored, honouring backslash
/// escapes.
pub fn find_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    balanced_end(text, start).map(|end| &text[start..end])
}

/// Byte index one past the brace closing the `{` at `start`.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_braces_in_noise() {
        let obj = extract("noise {\"a\":{\"b\":1}} trailing").unwrap();
        assert_eq!(Value::Object(obj), json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_array_unwraps_first_element() {
        let obj = extract("[{\"x\":1},{\"x\":2}]").unwrap();
        assert_eq!(Value::Object(obj), json!({"x": 1}));
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(extract(""), Err(ExtractError::EmptyResponse));
        assert_eq!(extract("  \n\t "), Err(ExtractError::EmptyResponse));
    }

    #[test]
    fn test_no_braces() {
        assert_eq!(extract("no braces here"), Err(ExtractError::NoJsonFound));
    }

    #[test]
    fn test_empty_array_is_empty_list() {
        assert_eq!(extract("[]"), Err(ExtractError::EmptyList));
    }

    #[test]
    fn test_array_of_scalars_is_malformed() {
        assert!(matches!(extract("[1, 2]"), Err(ExtractError::MalformedJson(_))));
    }

    #[test]
    fn test_markdown_fence() {
        let raw = "Here you go:\n```json\n{\"lyrics\": \"hello\"}\n```\nEnjoy!";
        let obj = extract(raw).unwrap();
        assert_eq!(obj["lyrics"], "hello");
    }

    #[test]
    fn test_not_greedy_across_two_objects() {
        let raw = "first {\"a\":1} then {\"b\":2}";
        let obj = extract(raw).unwrap();
        assert_eq!(Value::Object(obj), json!({"a": 1}));
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let raw = r#"result: {"pattern": "x-{-}-x", "note": "say \"}\""} done"#;
        let obj = extract(raw).unwrap();
        assert_eq!(obj["pattern"], "x-{-}-x");
        assert_eq!(obj["note"], "say \"}\"");
    }

    #[test]
    fn test_balanced_but_invalid_is_malformed() {
        let raw = "prefix {chord: C, duration: 4} suffix";
        assert!(matches!(extract(raw), Err(ExtractError::MalformedJson(_))));
    }

    #[test]
    fn test_unclosed_object_is_no_json() {
        assert_eq!(extract("{\"a\": {\"b\": 1}"), Err(ExtractError::NoJsonFound));
    }

    #[test]
    fn test_scalar_json_falls_back_to_scan() {
        assert_eq!(extract("42"), Err(ExtractError::NoJsonFound));
        assert_eq!(extract("\"just text\""), Err(ExtractError::NoJsonFound));
    }

    #[test]
    fn test_find_balanced_object_starts_at_first_brace() {
        assert_eq!(find_balanced_object("{ {\"k\":1}"), None);
        assert_eq!(find_balanced_object("a } b {\"k\":1}"), Some("{\"k\":1}"));
        assert_eq!(
            find_balanced_object("x {\"a\":[{\"b\":{}}]} y"),
            Some("{\"a\":[{\"b\":{}}]}")
        );
    }
}
