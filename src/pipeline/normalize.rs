//! Response normalisation: model reply text → untyped JSON value.
//!
//! Vision models often wrap JSON in a markdown fence even when asked not to.
//! The fence is stripped before parsing; schema checks happen later in
//! [`crate::pipeline::schema`].

use crate::error::RecognizeError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

// Opening fence with an optional `json` tag, the body, and an optional
// closing fence. The closing fence may be missing when the reply was cut off.
static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?i:json)?[ \t]*\r?\n?(.*?)\s*(?:```)?\s*$").unwrap());

/// Strip an optional markdown code fence and parse the rest as JSON.
pub fn normalize(raw: &str) -> Result<Value, RecognizeError> {
    let body = strip_json_fence(raw);
    serde_json::from_str(body).map_err(|e| RecognizeError::MalformedJson {
        detail: format!("{e} in {:?}", excerpt(body)),
    })
}

/// Remove a surrounding ```` ```json ```` fence, trimming at each step.
pub fn strip_json_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    match RE_JSON_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(body) => body.as_str().trim(),
        None => trimmed,
    }
}

pub(crate) fn excerpt(s: &str) -> String {
    const MAX: usize = 80;
    match s.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}\u{2026}", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fenced_json_is_unwrapped() {
        let v = normalize("```json\n{\"a\":1}\n```").unwrap();
        assert_eq!(v, json!({"a": 1}));
    }

    #[test]
    fn bare_json_parses() {
        assert_eq!(normalize("{\"a\":1}").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn not_json_is_malformed() {
        let err = normalize("not json").unwrap_err();
        assert!(matches!(err, RecognizeError::MalformedJson { .. }), "got: {err:?}");
    }

    #[test]
    fn missing_closing_fence_still_parses() {
        let v = normalize("```json\n{\"a\": [1, 2]}\n").unwrap();
        assert_eq!(v, json!({"a": [1, 2]}));
    }

    #[test]
    fn untagged_fence_and_surrounding_whitespace() {
        let v = normalize("  \n```\n  {\"ok\": true}  \n```  \n").unwrap();
        assert_eq!(v, json!({"ok": true}));
    }

    #[test]
    fn uppercase_tag_is_accepted() {
        assert_eq!(strip_json_fence("```JSON\n[1]\n```"), "[1]");
    }

    #[test]
    fn fence_on_one_line() {
        assert_eq!(strip_json_fence("```json {\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn prose_around_json_is_rejected() {
        let err = normalize("Here is the order: {\"a\":1}").unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }
}
