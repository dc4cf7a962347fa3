//! JSON-with-comments parser for `.planning/config.json`.
//!
//! Accepts the dialect agents actually write: `//` and `/* */` comments,
//! trailing commas, and an optional leading BOM. The cleaned text must still
//! be strict JSON; anything else is an error, never a silent default.

use crate::error::{GsdError, Result};
use serde_json::Value;

pub fn parse(text: &str) -> Result<Value> {
    let cleaned = strip_extensions(text);
    serde_json::from_str(&cleaned).map_err(|e| GsdError::Jsonc(e.to_string()))
}

/// Remove the BOM, comments outside string literals, and trailing commas.
fn strip_extensions(text: &str) -> String {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let without_comments = strip_comments(text);
    strip_trailing_commas(&without_comments)
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes: Vec<char> = text.chars().collect();
    let mut i = 0;
    let mut in_string = false;
    while i < bytes.len() {
        let c = bytes[i];
        if in_string {
            out.push(c);
            if c == '\\' && i + 1 < bytes.len() {
                // Escaped character, including \". Copy it through verbatim.
                out.push(bytes[i + 1]);
                i += 2;
                continue;
            }
            if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
                i += 1;
            }
            '/' if i + 1 < bytes.len() && bytes[i + 1] == '/' => {
                // Line comment: drop up to (not including) the newline.
                while i < bytes.len() && bytes[i] != '\n' {
                    i += 1;
                }
            }
            '/' if i + 1 < bytes.len() && bytes[i + 1] == '*' => {
                // Block comment: non-nesting, first */ terminates.
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == '*' && bytes[i + 1] == '/') {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes: Vec<char> = text.chars().collect();
    let mut i = 0;
    let mut in_string = false;
    while i < bytes.len() {
        let c = bytes[i];
        if in_string {
            out.push(c);
            if c == '\\' && i + 1 < bytes.len() {
                out.push(bytes[i + 1]);
                i += 2;
                continue;
            }
            if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if c == '"' {
            in_string = true;
            out.push(c);
            i += 1;
            continue;
        }
        if c == ',' {
            // Lookahead past whitespace; drop the comma before } or ].
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_whitespace() {
                j += 1;
            }
            if j < bytes.len() && (bytes[j] == '}' || bytes[j] == ']') {
                i += 1;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json_passes_through() {
        let v = parse(r#"{"model_profile": "balanced", "commit_docs": true}"#).unwrap();
        assert_eq!(v, json!({"model_profile": "balanced", "commit_docs": true}));
    }

    #[test]
    fn strips_bom() {
        let v = parse("\u{feff}{\"a\": 1}").unwrap();
        assert_eq!(v, json!({"a": 1}));
    }

    #[test]
    fn strips_line_comments() {
        let v = parse("{\n  // profile used by agents\n  \"model_profile\": \"quality\"\n}").unwrap();
        assert_eq!(v, json!({"model_profile": "quality"}));
    }

    #[test]
    fn strips_block_comments() {
        let v = parse("{\"a\": /* inline */ 1, \"b\": 2}").unwrap();
        assert_eq!(v, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn block_comment_does_not_nest() {
        // First */ terminates; the trailing text must still be valid JSON.
        let v = parse("[1, /* a /* b */ 2]").unwrap();
        assert_eq!(v, json!([1, 2]));
    }

    #[test]
    fn preserves_comment_markers_inside_strings() {
        let v = parse(r#"{"url": "https://example.com", "glob": "src/**/*.js"}"#).unwrap();
        assert_eq!(v["url"], "https://example.com");
        assert_eq!(v["glob"], "src/**/*.js");
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let v = parse(r#"{"msg": "say \"hi\" // not a comment"}"#).unwrap();
        assert_eq!(v["msg"], r#"say "hi" // not a comment"#);
    }

    #[test]
    fn removes_trailing_commas() {
        let v = parse("{\"a\": [1, 2,], \"b\": {\"c\": 3,},}").unwrap();
        assert_eq!(v, json!({"a": [1, 2], "b": {"c": 3}}));
    }

    #[test]
    fn trailing_comma_with_newline_before_close() {
        let v = parse("{\n  \"a\": 1,\n}").unwrap();
        assert_eq!(v, json!({"a": 1}));
    }

    #[test]
    fn comma_inside_string_is_kept() {
        let v = parse(r#"{"list": "a, b, c,"}"#).unwrap();
        assert_eq!(v["list"], "a, b, c,");
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = parse("{broken").unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse("").is_err());
        assert!(parse("// only a comment").is_err());
    }

    #[test]
    fn round_trips_arbitrary_values() {
        for v in [
            json!(null),
            json!(42),
            json!("text with // inside"),
            json!([1, "two", {"three": 3.5}]),
            json!({"nested": {"deep": [true, false]}}),
        ] {
            let encoded = serde_json::to_string(&v).unwrap();
            assert_eq!(parse(&encoded).unwrap(), v);
            assert_eq!(parse(&format!("\u{feff}{encoded}")).unwrap(), v);
        }
    }
}
