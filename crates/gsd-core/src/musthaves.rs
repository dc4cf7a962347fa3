//! Must-haves block parsing.
//!
//! Plans carry a `must_haves:` block in their frontmatter describing what the
//! executed phase must leave behind: observable truths, artifact files, and
//! cross-file links. The block is a fixed micro-schema, not general YAML, and
//! authors indent it inconsistently, so the parser keys on relative
//! indentation instead of absolute columns.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Artifact {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provides: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_lines: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyLink {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MustHaves {
    pub truths: Vec<String>,
    pub artifacts: Vec<Artifact>,
    pub key_links: Vec<KeyLink>,
}

impl MustHaves {
    pub fn is_empty(&self) -> bool {
        self.truths.is_empty() && self.artifacts.is_empty() && self.key_links.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Line tokenizer
// ---------------------------------------------------------------------------

enum Line<'a> {
    Blank,
    /// `key:` or `key: rest`, key made of [a-z_] characters.
    Key {
        indent: usize,
        key: &'a str,
        rest: &'a str,
    },
    /// `- rest` list item.
    Item {
        indent: usize,
        rest: &'a str,
    },
    Other {
        indent: usize,
    },
}

fn tokenize(line: &str) -> Line<'_> {
    let trimmed = line.trim_end();
    if trimmed.trim().is_empty() {
        return Line::Blank;
    }
    let indent = trimmed.len() - trimmed.trim_start().len();
    let body = trimmed.trim_start();
    if let Some(rest) = body.strip_prefix("- ") {
        return Line::Item { indent, rest };
    }
    if body == "-" {
        return Line::Item { indent, rest: "" };
    }
    if let Some((key, rest)) = body.split_once(':') {
        let key = key.trim();
        if !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Line::Key {
                indent,
                key,
                rest: rest.trim(),
            };
        }
    }
    Line::Other { indent }
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Locate the `must_haves:` block anywhere in `text` and parse it. Returns
/// `None` when no block exists. Unknown keys inside items are ignored.
pub fn extract(text: &str) -> Option<MustHaves> {
    let lines: Vec<&str> = text.lines().collect();
    let mut start = None;
    let mut block_indent = 0;
    for (i, raw) in lines.iter().enumerate() {
        if let Line::Key { indent, key, rest } = tokenize(raw) {
            if key == "must_haves" && rest.is_empty() {
                start = Some(i + 1);
                block_indent = indent;
                break;
            }
        }
    }
    let start = start?;

    let mut result = MustHaves::default();
    let mut i = start;
    while i < lines.len() {
        match tokenize(lines[i]) {
            Line::Blank => i += 1,
            Line::Key { indent, key, rest } if indent > block_indent => {
                let (items, next) = collect_items(&lines, i + 1, indent, rest);
                match key {
                    "truths" => {
                        result.truths = items
                            .iter()
                            .filter_map(|item| {
                                let text = unquote(&item.head);
                                (!text.is_empty()).then(|| text.to_string())
                            })
                            .collect();
                    }
                    "artifacts" => {
                        result.artifacts = items.iter().map(Item::to_artifact).collect();
                    }
                    "key_links" => {
                        result.key_links = items.iter().map(Item::to_key_link).collect();
                    }
                    _ => {}
                }
                i = next;
            }
            // Sibling of must_haves or shallower: the block is over.
            _ => break,
        }
    }
    Some(result)
}

/// A list item: its first line plus any `key: value` continuation fields.
struct Item {
    head: String,
    fields: Vec<(String, String)>,
}

impl Item {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn to_artifact(&self) -> Artifact {
        Artifact {
            path: self.field("path").map(unquote).unwrap_or_default().to_string(),
            provides: self.field("provides").map(|v| unquote(v).to_string()),
            min_lines: self.field("min_lines").and_then(|v| unquote(v).parse().ok()),
        }
    }

    fn to_key_link(&self) -> KeyLink {
        KeyLink {
            from: self.field("from").map(unquote).unwrap_or_default().to_string(),
            to: self.field("to").map(unquote).unwrap_or_default().to_string(),
            via: self.field("via").map(|v| unquote(v).to_string()),
            pattern: self.field("pattern").map(|v| unquote(v).to_string()),
        }
    }
}

/// Collect the `- ` items of a sub-list starting at `from`. `rest` is the
/// text after the sub-list key, which may already be an inline `[]`.
fn collect_items<'a>(
    lines: &[&'a str],
    from: usize,
    key_indent: usize,
    rest: &str,
) -> (Vec<Item>, usize) {
    if !rest.is_empty() {
        // Inline value, normally `[]`. Nothing nested follows.
        return (Vec::new(), from);
    }
    let mut items: Vec<Item> = Vec::new();
    let mut item_indent = None;
    let mut i = from;
    while i < lines.len() {
        match tokenize(lines[i]) {
            Line::Blank => i += 1,
            Line::Item { indent, rest } if indent > key_indent => {
                match item_indent {
                    None => item_indent = Some(indent),
                    Some(expected) if indent != expected => break,
                    Some(_) => {}
                }
                // The head may itself be the item's first field.
                let mut item = Item {
                    head: rest.to_string(),
                    fields: Vec::new(),
                };
                if let Line::Key { key, rest, .. } = tokenize(rest) {
                    item.fields.push((key.to_string(), rest.to_string()));
                }
                items.push(item);
                i += 1;
            }
            Line::Key { indent, key, rest }
                if item_indent.is_some_and(|it| indent > it) && !items.is_empty() =>
            {
                if let Some(item) = items.last_mut() {
                    item.fields.push((key.to_string(), rest.to_string()));
                }
                i += 1;
            }
            _ => break,
        }
    }
    (items, i)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_artifacts_with_extra_indentation() {
        let text = "---\nphase: 01\nmust_haves:\n    artifacts:\n      - path: \"src/test.js\"\n        provides: \"Test module\"\n        min_lines: 10\n---\n";
        let mh = extract(text).unwrap();
        assert_eq!(mh.artifacts.len(), 1);
        assert_eq!(mh.artifacts[0].path, "src/test.js");
        assert_eq!(mh.artifacts[0].provides.as_deref(), Some("Test module"));
        assert_eq!(mh.artifacts[0].min_lines, Some(10));
    }

    #[test]
    fn parses_key_links_without_pattern() {
        let text = "must_haves:\n  key_links:\n    - from: src/main.js\n      to: src/db.js\n      via: require import\n";
        let mh = extract(text).unwrap();
        assert_eq!(mh.key_links.len(), 1);
        assert_eq!(mh.key_links[0].from, "src/main.js");
        assert_eq!(mh.key_links[0].to, "src/db.js");
        assert_eq!(mh.key_links[0].via.as_deref(), Some("require import"));
        assert_eq!(mh.key_links[0].pattern, None);
    }

    #[test]
    fn parses_truths_as_plain_strings() {
        let text = "must_haves:\n  truths:\n    - \"User can log in\"\n    - Dashboard renders\n  artifacts: []\n";
        let mh = extract(text).unwrap();
        assert_eq!(
            mh.truths,
            vec!["User can log in".to_string(), "Dashboard renders".to_string()]
        );
        assert!(mh.artifacts.is_empty());
    }

    #[test]
    fn inline_empty_lists_parse_as_empty() {
        let text = "must_haves:\n  truths: []\n  artifacts: []\n  key_links: []\n";
        let mh = extract(text).unwrap();
        assert!(mh.is_empty());
    }

    #[test]
    fn stops_at_sibling_key() {
        let text = "must_haves:\n  artifacts:\n    - path: a.js\nautonomous: true\n";
        let mh = extract(text).unwrap();
        assert_eq!(mh.artifacts.len(), 1);
    }

    #[test]
    fn multiple_items_collected() {
        let text = "must_haves:\n  artifacts:\n    - path: a.js\n      min_lines: 5\n    - path: b.js\n";
        let mh = extract(text).unwrap();
        assert_eq!(mh.artifacts.len(), 2);
        assert_eq!(mh.artifacts[0].min_lines, Some(5));
        assert_eq!(mh.artifacts[1].path, "b.js");
        assert_eq!(mh.artifacts[1].min_lines, None);
    }

    #[test]
    fn absent_block_is_none() {
        assert!(extract("---\nphase: 01\n---\nbody\n").is_none());
    }

    #[test]
    fn unknown_item_fields_ignored() {
        let text = "must_haves:\n  artifacts:\n    - path: a.js\n      color: red\n";
        let mh = extract(text).unwrap();
        assert_eq!(mh.artifacts[0].path, "a.js");
    }
}
