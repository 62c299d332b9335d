//! JSON extraction from language-model replies.
//!
//! Models are asked for strict JSON but wrap it in markdown fences or
//! prose often enough that both shapes must parse.

use serde::de::DeserializeOwned;

/// Extract the first JSON value from a model reply.
///
/// Strategy 1: a fenced ```json block. Strategy 2: the outermost bare
/// object or array. Returns `None` when neither parses.
pub fn extract_json<T: DeserializeOwned>(response: &str) -> Option<T> {
    if let Some(fence_start) = response.find("```json") {
        let after_fence = &response[fence_start + "```json".len()..];
        if let Some(json_start) = after_fence.find(|c: char| !c.is_whitespace()) {
            let json_body = &after_fence[json_start..];
            if let Some(fence_end) = json_body.find("```") {
                let json_str = json_body[..fence_end].trim();
                if let Ok(value) = serde_json::from_str(json_str) {
                    return Some(value);
                }
            }
        }
    }

    // Bare value: widest '{'..'}' or '['..']' span.
    let trimmed = response.trim();
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) {
            if end > start {
                if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                    return Some(value);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn extracts_fenced_json() {
        let raw = "Sure!\n```json\n{\"kind\":\"preference\"}\n```\nhope that helps";
        let value: Value = extract_json(raw).unwrap();
        assert_eq!(value["kind"], "preference");
    }

    #[test]
    fn extracts_bare_object_with_surrounding_text() {
        let raw = "preamble {\"a\": 1} epilogue";
        let value: Value = extract_json(raw).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn extracts_bare_array() {
        let raw = "here you go: [\"TypeScript\", \"React\"]";
        let value: Vec<String> = extract_json(raw).unwrap();
        assert_eq!(value, vec!["TypeScript", "React"]);
    }

    #[test]
    fn fenced_takes_precedence_over_bare() {
        let raw = "{\"wrong\": true}\n```json\n{\"right\": true}\n```";
        let value: Value = extract_json(raw).unwrap();
        assert_eq!(value["right"], true);
    }

    #[test]
    fn nested_braces_survive() {
        let raw = r#"{"outer":{"inner":"{}"}}"#;
        let value: Value = extract_json(raw).unwrap();
        assert_eq!(value["outer"]["inner"], "{}");
    }

    #[test]
    fn plain_text_yields_none() {
        assert!(extract_json::<Value>("no json here").is_none());
        assert!(extract_json::<Value>("").is_none());
        assert!(extract_json::<Value>("```json\n{broken\n```").is_none());
    }
}
