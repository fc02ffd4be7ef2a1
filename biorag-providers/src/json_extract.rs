//! "Parse or null" JSON extraction for chat-LLM responses.
//!
//! LLMs asked for JSON routinely wrap it in a markdown code fence. Rather
//! than treating a parse failure as an error, callers get `None` back and
//! decide locally whether that's `cannot_determine`, a retry, or a logged
//! warning — mirroring the original's `(Optional[Dict], raw_text)` return
//! shape.

/// Strip a leading ` ```json ` / ` ``` ` fence and trailing ` ``` `, then
/// attempt to parse the result as a [`serde_json::Value`]. Returns `None`
/// (never an error) on any parse failure.
pub fn parse_json_or_null(raw: &str) -> Option<serde_json::Value> {
    let cleaned = strip_code_fence(raw);
    serde_json::from_str(cleaned.trim()).ok()
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let after_open = after_open
        .strip_prefix("json")
        .unwrap_or(after_open)
        .trim_start_matches(['\r', '\n']);
    after_open.strip_suffix("```").unwrap_or(after_open).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json() {
        let v = parse_json_or_null(r#"{"a": 1}"#).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"a\": 1}\n```";
        let v = parse_json_or_null(raw).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn strips_bare_fence_without_language_tag() {
        let raw = "```\n{\"a\": 2}\n```";
        let v = parse_json_or_null(raw).unwrap();
        assert_eq!(v["a"], 2);
    }

    #[test]
    fn returns_none_on_garbage() {
        assert!(parse_json_or_null("not json at all").is_none());
    }
}
