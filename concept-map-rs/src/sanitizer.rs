//! Response sanitization
//!
//! Models frequently wrap JSON in a markdown code fence even when told not
//! to. [`sanitize`] removes one leading fence (optionally tagged `json`) and
//! one trailing fence. The interior is returned untouched, and text without
//! fences comes back unchanged.
//!
//! Multiple or nested fences are not unwrapped any further; whatever remains
//! is left for the JSON parser to reject.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Opening fence: optional leading whitespace, three backticks, optional `json` tag
    static ref OPENING_FENCE: Regex = Regex::new(r"^\s*```(?:json|JSON)?[ \t]*\r?\n?").unwrap();

    /// Closing fence: optional newline, three backticks, optional trailing whitespace
    static ref CLOSING_FENCE: Regex = Regex::new(r"\r?\n?```\s*$").unwrap();
}

/// Strips code-fence wrapping from raw upstream text
pub fn sanitize(raw: &str) -> &str {
    let start = OPENING_FENCE.find(raw).map(|m| m.end()).unwrap_or(0);
    let body = &raw[start..];
    let end = CLOSING_FENCE
        .find(body)
        .map(|m| m.start())
        .unwrap_or(body.len());
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const MAP: &str = r#"{"target":"React","prerequisites":[]}"#;

    #[test_case("```json\n{\"a\":1}\n```", "{\"a\":1}" ; "tagged fence")]
    #[test_case("```\n{\"a\":1}\n```", "{\"a\":1}" ; "untagged fence")]
    #[test_case("```json{\"a\":1}```", "{\"a\":1}" ; "fence without newlines")]
    #[test_case("  ```json\r\n{\"a\":1}\r\n```  \n", "{\"a\":1}" ; "crlf and surrounding whitespace")]
    #[test_case("```json\n{\"a\":1}", "{\"a\":1}" ; "opening fence only")]
    #[test_case("{\"a\":1}\n```", "{\"a\":1}" ; "closing fence only")]
    #[test_case("invalid json {", "invalid json {" ; "plain text untouched")]
    fn test_sanitize(raw: &str, expected: &str) {
        assert_eq!(sanitize(raw), expected);
    }

    #[test]
    fn test_unwrapped_json_is_noop() {
        assert_eq!(sanitize(MAP), MAP);
        let pretty = "{\n  \"target\": \"React\"\n}\n";
        assert_eq!(sanitize(pretty), pretty);
    }

    #[test]
    fn test_idempotent() {
        let raw = format!("```json\n{}\n```", MAP);
        let once = sanitize(&raw);
        assert_eq!(once, MAP);
        assert_eq!(sanitize(once), once);
    }

    #[test]
    fn test_interior_fences_untouched() {
        let raw = "```json\n{\"description\":\"use ``` for code\"}\n```";
        assert_eq!(sanitize(raw), "{\"description\":\"use ``` for code\"}");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("```json\n```"), "");
    }
}
