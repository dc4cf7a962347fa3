//! Frontmatter codec for planning documents.
//!
//! This is not a YAML parser. It implements exactly the dialect project
//! documents use: scalar values, inline `[a, b]` lists, block `- item`
//! lists, and one level of nested mapping whose subkeys flatten into
//! top-level result keys (`dependency-graph:` yields `provides`, `affects`).
//! Malformed entries are dropped and reported, never raised.

use crate::error::{GsdError, Result};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
    /// One level of nesting, used on the write side (e.g. OpenCode's
    /// `tools:` map of booleans). The parser never produces this; nested
    /// input flattens instead.
    Map(Vec<(String, Value)>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// List coercion for fields that may be written as a scalar or a list.
    pub fn to_string_list(&self) -> Vec<String> {
        match self {
            Value::List(items) => items.clone(),
            Value::Str(s) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => serde_json::Value::from(items.clone()),
            Value::Map(pairs) => {
                let mut obj = serde_json::Map::new();
                for (k, v) in pairs {
                    obj.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(obj)
            }
        }
    }

    pub fn from_json(v: &serde_json::Value) -> Value {
        match v {
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Str(n.to_string()),
            },
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => Value::List(
                items
                    .iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            serde_json::Value::Object(obj) => Value::Map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
            serde_json::Value::Null => Value::Str(String::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Ordered key/value mapping. Keys are unique; `set` replaces in place so
/// serialization keeps the original document's field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(String, Value)>,
}

impl Mapping {
    pub fn new() -> Mapping {
        Mapping::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        for (k, v) in &self.entries {
            obj.insert(k.clone(), v.to_json());
        }
        serde_json::Value::Object(obj)
    }
}

// ---------------------------------------------------------------------------
// Splitting
// ---------------------------------------------------------------------------

/// Split a document into its frontmatter block and body.
///
/// Frontmatter exists only when the first line is exactly `---` and a later
/// line closes the block. An unterminated opener means no frontmatter: the
/// entire text is body.
pub fn split(text: &str) -> (Option<&str>, &str) {
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (None, text);
    };
    if first.trim_end() != "---" {
        return (None, text);
    }
    let fm_start = first.len();
    let mut pos = fm_start;
    for line in lines {
        if line.trim_end() == "---" {
            let front = &text[fm_start..pos];
            let body = &text[pos + line.len()..];
            return (Some(front), body);
        }
        pos += line.len();
    }
    (None, text)
}

// ---------------------------------------------------------------------------
// Parsing: line tokenizer + small recursive descent
// ---------------------------------------------------------------------------

/// Parse result. `skipped` names keys dropped for malformed syntax; callers
/// that need all-or-nothing semantics (the history digest) branch on it.
#[derive(Debug, Default)]
pub struct Parsed {
    pub mapping: Mapping,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum Line<'a> {
    Blank,
    Pair {
        indent: usize,
        key: &'a str,
        value: &'a str,
    },
    Item {
        indent: usize,
        text: &'a str,
    },
    Other,
}

fn tokenize(front: &str) -> Vec<Line<'_>> {
    front
        .lines()
        .map(|raw| {
            let indent = raw.len() - raw.trim_start_matches(' ').len();
            let trimmed = raw[indent..].trim_end();
            if trimmed.is_empty() {
                return Line::Blank;
            }
            if let Some(item) = trimmed.strip_prefix("- ") {
                return Line::Item {
                    indent,
                    text: item.trim(),
                };
            }
            if trimmed == "-" {
                return Line::Item { indent, text: "" };
            }
            if let Some(colon) = trimmed.find(':') {
                let key = trimmed[..colon].trim_end();
                if is_key(key) {
                    return Line::Pair {
                        indent,
                        key,
                        value: trimmed[colon + 1..].trim(),
                    };
                }
            }
            Line::Other
        })
        .collect()
}

fn is_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

enum Block {
    List(Vec<String>),
    Nested(Vec<(String, Value)>),
    Empty,
}

pub fn parse(front: &str) -> Parsed {
    let lines = tokenize(front);
    let mut parsed = Parsed::default();
    let mut i = 0;
    while i < lines.len() {
        let Line::Pair {
            indent: 0,
            key,
            value,
        } = lines[i]
        else {
            i += 1;
            continue;
        };
        i += 1;
        if !value.is_empty() {
            match parse_scalar(value) {
                Ok(v) => parsed.mapping.set(key, v),
                Err(()) => parsed.skipped.push(key.to_string()),
            }
            continue;
        }
        let (consumed, block) = parse_block(&lines[i..], &mut parsed.skipped);
        i += consumed;
        match block {
            Block::List(items) => parsed.mapping.set(key, Value::List(items)),
            // One level of nesting flattens: each subkey becomes a top-level
            // key of the result (`dependency-graph.provides` reads as
            // `provides`).
            Block::Nested(pairs) => {
                for (subkey, v) in pairs {
                    parsed.mapping.set(subkey, v);
                }
            }
            Block::Empty => parsed.mapping.set(key, Value::Str(String::new())),
        }
    }
    parsed
}

fn parse_block(lines: &[Line<'_>], skipped: &mut Vec<String>) -> (usize, Block) {
    let Some(first) = lines.first() else {
        return (0, Block::Empty);
    };
    match *first {
        Line::Item { indent, .. } if indent > 0 => {
            let mut items = Vec::new();
            let mut consumed = 0;
            for line in lines {
                match *line {
                    Line::Item { indent: i, text } if i >= indent => {
                        items.push(strip_quotes(text).to_string());
                        consumed += 1;
                    }
                    _ => break,
                }
            }
            (consumed, Block::List(items))
        }
        Line::Pair { indent, .. } if indent > 0 => {
            let mut pairs = Vec::new();
            let mut consumed = 0;
            while consumed < lines.len() {
                let Line::Pair {
                    indent: i,
                    key,
                    value,
                } = lines[consumed]
                else {
                    break;
                };
                if i != indent {
                    break;
                }
                consumed += 1;
                if !value.is_empty() {
                    match parse_scalar(value) {
                        Ok(v) => pairs.push((key.to_string(), v)),
                        Err(()) => skipped.push(key.to_string()),
                    }
                    continue;
                }
                // Deeper list under a nested key.
                let mut items = Vec::new();
                while consumed < lines.len() {
                    match lines[consumed] {
                        Line::Item { indent: j, text } if j > indent => {
                            items.push(strip_quotes(text).to_string());
                            consumed += 1;
                        }
                        _ => break,
                    }
                }
                if items.is_empty() {
                    pairs.push((key.to_string(), Value::Str(String::new())));
                } else {
                    pairs.push((key.to_string(), Value::List(items)));
                }
            }
            (consumed, Block::Nested(pairs))
        }
        _ => (0, Block::Empty),
    }
}

/// Coerce a raw scalar: inline list, boolean, integer, or quoted string.
/// `Err(())` marks unterminated inline-list syntax; the caller drops the key.
fn parse_scalar(value: &str) -> std::result::Result<Value, ()> {
    if let Some(rest) = value.strip_prefix('[') {
        let Some(inner) = rest.strip_suffix(']') else {
            return Err(());
        };
        if inner.trim().is_empty() {
            return Ok(Value::List(Vec::new()));
        }
        let items = inner
            .split(',')
            .map(|item| strip_quotes(item.trim()).to_string())
            .collect();
        return Ok(Value::List(items));
    }
    if value == "true" {
        return Ok(Value::Bool(true));
    }
    if value == "false" {
        return Ok(Value::Bool(false));
    }
    if is_integer(value) {
        if let Ok(n) = value.parse::<i64>() {
            return Ok(Value::Int(n));
        }
    }
    Ok(Value::Str(strip_quotes(value).to_string()))
}

fn is_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    // Zero-padded identifiers ("01", "03") stay textual.
    digits.len() == 1 || !digits.starts_with('0')
}

fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2 {
        let bytes = s.as_bytes();
        let (first, last) = (bytes[0], bytes[s.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    Inline,
    Block,
}

pub fn serialize(mapping: &Mapping, style: ListStyle) -> String {
    let mut out = String::new();
    for (key, value) in mapping.iter() {
        match value {
            Value::Str(s) => {
                if s.is_empty() {
                    out.push_str(&format!("{key}:\n"));
                } else {
                    out.push_str(&format!("{key}: {}\n", quote_scalar(s)));
                }
            }
            Value::Int(n) => out.push_str(&format!("{key}: {n}\n")),
            Value::Bool(b) => out.push_str(&format!("{key}: {b}\n")),
            Value::List(items) => match style {
                ListStyle::Inline => {
                    let rendered: Vec<String> =
                        items.iter().map(|item| quote_scalar(item)).collect();
                    out.push_str(&format!("{key}: [{}]\n", rendered.join(", ")));
                }
                ListStyle::Block => {
                    out.push_str(&format!("{key}:\n"));
                    for item in items {
                        out.push_str(&format!("  - {}\n", quote_scalar(item)));
                    }
                }
            },
            Value::Map(pairs) => {
                out.push_str(&format!("{key}:\n"));
                for (subkey, v) in pairs {
                    match v {
                        Value::Bool(b) => out.push_str(&format!("  {subkey}: {b}\n")),
                        Value::Int(n) => out.push_str(&format!("  {subkey}: {n}\n")),
                        Value::List(items) => {
                            let rendered: Vec<String> =
                                items.iter().map(|item| quote_scalar(item)).collect();
                            out.push_str(&format!("  {subkey}: [{}]\n", rendered.join(", ")));
                        }
                        other => {
                            let rendered = other.as_str().unwrap_or_default();
                            out.push_str(&format!("  {subkey}: {}\n", quote_scalar(rendered)));
                        }
                    }
                }
            }
        }
    }
    out
}

/// Quote a scalar when the bare form would re-parse as something else:
/// colons, surrounding whitespace, `#`/`[`/`-` openers, boolean and integer
/// literals.
fn quote_scalar(s: &str) -> String {
    let needs_quotes = s.contains(':')
        || s.contains(',')
        || s.trim() != s
        || s.starts_with('#')
        || s.starts_with('[')
        || s.starts_with("- ")
        || s == "true"
        || s == "false"
        || is_integer(s);
    if needs_quotes {
        format!("\"{s}\"")
    } else {
        s.to_string()
    }
}

/// Rebuild a full document from a mapping and body.
pub fn compose(mapping: &Mapping, body: &str, style: ListStyle) -> String {
    format!("---\n{}---\n{}", serialize(mapping, style), body)
}

/// Merge JSON patch fields into a document's frontmatter, overwriting
/// existing keys and preserving the body. A document without frontmatter
/// gains a block. Returns the rewritten document and the merged field names.
pub fn merge(document: &str, patch: &serde_json::Value) -> Result<(String, Vec<String>)> {
    let serde_json::Value::Object(fields) = patch else {
        return Err(GsdError::InvalidInput(
            "merge data must be a JSON object".to_string(),
        ));
    };
    let (front, body) = split(document);
    let mut mapping = front.map(|f| parse(f).mapping).unwrap_or_default();
    let mut merged = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        mapping.set(key.clone(), Value::from_json(value));
        merged.push(key.clone());
    }
    Ok((compose(&mapping, body, ListStyle::Inline), merged))
}

/// Set one frontmatter field, coercing the raw value like the parser would.
pub fn set_field(document: &str, field: &str, raw_value: &str) -> String {
    let (front, body) = split(document);
    let mut mapping = front.map(|f| parse(f).mapping).unwrap_or_default();
    let value = parse_scalar(raw_value).unwrap_or_else(|()| Value::Str(raw_value.to_string()));
    mapping.set(field, value);
    compose(&mapping, body, ListStyle::Inline)
}

// ---------------------------------------------------------------------------
// Schema validation
// ---------------------------------------------------------------------------

const PLAN_REQUIRED: &[&str] = &[
    "phase",
    "plan",
    "type",
    "wave",
    "depends_on",
    "files_modified",
    "autonomous",
    "must_haves",
];

const SUMMARY_REQUIRED: &[&str] = &[
    "phase",
    "plan",
    "subsystem",
    "tags",
    "duration",
    "completed",
];

#[derive(Debug, Serialize)]
pub struct SchemaReport {
    pub valid: bool,
    pub schema: String,
    pub missing: Vec<String>,
}

pub fn validate(mapping: &Mapping, schema: &str) -> Result<SchemaReport> {
    let required = match schema {
        "plan" => PLAN_REQUIRED,
        "summary" => SUMMARY_REQUIRED,
        other => return Err(GsdError::UnknownSchema(other.to_string())),
    };
    let missing: Vec<String> = required
        .iter()
        .filter(|key| !mapping.contains(key))
        .map(|key| key.to_string())
        .collect();
    Ok(SchemaReport {
        valid: missing.is_empty(),
        schema: schema.to_string(),
        missing,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_basic() {
        let (front, body) = split("---\nphase: 01\n---\n# Body\n");
        assert_eq!(front, Some("phase: 01\n"));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn split_without_frontmatter() {
        let (front, body) = split("# Just a document\n");
        assert_eq!(front, None);
        assert_eq!(body, "# Just a document\n");
    }

    #[test]
    fn split_unterminated_is_all_body() {
        let text = "---\nphase: 01\nno closing delimiter";
        let (front, body) = split(text);
        assert_eq!(front, None);
        assert_eq!(body, text);
    }

    #[test]
    fn split_empty_frontmatter() {
        let (front, body) = split("---\n---\nbody");
        assert_eq!(front, Some(""));
        assert_eq!(body, "body");
    }

    #[test]
    fn parse_scalars() {
        let parsed = parse("phase: 01-foundation\nwave: 2\nautonomous: true\nnote: \"quoted: text\"\n");
        let m = &parsed.mapping;
        assert_eq!(m.get("phase").unwrap().as_str(), Some("01-foundation"));
        assert_eq!(m.get("wave").unwrap().as_int(), Some(2));
        assert_eq!(m.get("autonomous").unwrap().as_bool(), Some(true));
        assert_eq!(m.get("note").unwrap().as_str(), Some("quoted: text"));
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn zero_padded_numbers_stay_strings() {
        let parsed = parse("plan: 03\nwave: 3\nzero: 0\n");
        assert_eq!(parsed.mapping.get("plan").unwrap().as_str(), Some("03"));
        assert_eq!(parsed.mapping.get("wave").unwrap().as_int(), Some(3));
        assert_eq!(parsed.mapping.get("zero").unwrap().as_int(), Some(0));
    }

    #[test]
    fn parse_inline_list() {
        let parsed = parse("files-modified: [src/a.js, src/b.js]\n");
        assert_eq!(
            parsed.mapping.get("files-modified").unwrap().as_list(),
            Some(&["src/a.js".to_string(), "src/b.js".to_string()][..])
        );
    }

    #[test]
    fn parse_inline_list_quoted_elements() {
        let parsed = parse("provides: [\"Pattern X\", \"Pattern Y\"]\n");
        assert_eq!(
            parsed.mapping.get("provides").unwrap().as_list(),
            Some(&["Pattern X".to_string(), "Pattern Y".to_string()][..])
        );
    }

    #[test]
    fn parse_empty_inline_list() {
        let parsed = parse("tags: []\n");
        assert_eq!(parsed.mapping.get("tags").unwrap().as_list(), Some(&[][..]));
    }

    #[test]
    fn parse_block_list() {
        let parsed = parse("patterns-established:\n  - Repository pattern\n  - \"Error boundaries\"\n");
        assert_eq!(
            parsed.mapping.get("patterns-established").unwrap().as_list(),
            Some(&["Repository pattern".to_string(), "Error boundaries".to_string()][..])
        );
    }

    #[test]
    fn parse_nested_block_flattens() {
        let text = "dependency-graph:\n  provides:\n    - Feature A\n    - Feature B\n  affects: [Module C]\n";
        let parsed = parse(text);
        assert!(parsed.mapping.get("dependency-graph").is_none());
        assert_eq!(
            parsed.mapping.get("provides").unwrap().as_list(),
            Some(&["Feature A".to_string(), "Feature B".to_string()][..])
        );
        assert_eq!(
            parsed.mapping.get("affects").unwrap().as_list(),
            Some(&["Module C".to_string()][..])
        );
    }

    #[test]
    fn parse_tech_stack_added() {
        let parsed = parse("tech-stack:\n  added:\n    - prisma\n");
        assert_eq!(
            parsed.mapping.get("added").unwrap().as_list(),
            Some(&["prisma".to_string()][..])
        );
    }

    #[test]
    fn malformed_inline_list_is_skipped_not_fatal() {
        let parsed = parse("broken: [unclosed\nphase: 02\n");
        assert!(parsed.mapping.get("broken").is_none());
        assert_eq!(parsed.skipped, vec!["broken".to_string()]);
        assert_eq!(parsed.mapping.get("phase").unwrap().as_str(), Some("02"));
    }

    #[test]
    fn stray_prose_lines_are_ignored() {
        let parsed = parse("phase: 01\nSome prose line without a key\nplan: 2\n");
        assert_eq!(parsed.mapping.get("phase").unwrap().as_str(), Some("01"));
        assert_eq!(parsed.mapping.get("plan").unwrap().as_int(), Some(2));
    }

    #[test]
    fn set_replaces_preserving_order() {
        let mut m = Mapping::new();
        m.set("a", Value::Int(1));
        m.set("b", Value::Int(2));
        m.set("a", Value::Int(3));
        let keys: Vec<&str> = m.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(m.get("a").unwrap().as_int(), Some(3));
    }

    #[test]
    fn serialize_inline_and_block_lists() {
        let mut m = Mapping::new();
        m.set("tools", Value::List(vec!["read".into(), "bash".into()]));
        assert_eq!(serialize(&m, ListStyle::Inline), "tools: [read, bash]\n");
        assert_eq!(serialize(&m, ListStyle::Block), "tools:\n  - read\n  - bash\n");
    }

    #[test]
    fn serialize_quotes_ambiguous_scalars() {
        let mut m = Mapping::new();
        m.set("desc", Value::str("plan: phase one"));
        m.set("color", Value::str("#10B981"));
        m.set("count", Value::str("42"));
        let out = serialize(&m, ListStyle::Inline);
        assert!(out.contains("desc: \"plan: phase one\""));
        assert!(out.contains("color: \"#10B981\""));
        assert!(out.contains("count: \"42\""));
    }

    #[test]
    fn serialize_map_of_booleans() {
        let mut m = Mapping::new();
        m.set(
            "tools",
            Value::Map(vec![
                ("read".to_string(), Value::Bool(true)),
                ("bash".to_string(), Value::Bool(true)),
            ]),
        );
        assert_eq!(
            serialize(&m, ListStyle::Inline),
            "tools:\n  read: true\n  bash: true\n"
        );
    }

    #[test]
    fn round_trip_preserves_content() {
        let mut m = Mapping::new();
        m.set("name", Value::str("gsd-executor"));
        m.set("wave", Value::Int(3));
        m.set("autonomous", Value::Bool(false));
        m.set("files", Value::List(vec!["src/a.rs".into(), "src/b.rs".into()]));
        m.set("literal", Value::str("true"));
        for style in [ListStyle::Inline, ListStyle::Block] {
            let text = serialize(&m, style);
            let reparsed = parse(&text);
            assert!(reparsed.skipped.is_empty(), "style {style:?}: {text}");
            assert_eq!(reparsed.mapping, m, "style {style:?}: {text}");
        }
    }

    #[test]
    fn merge_overwrites_and_appends() {
        let doc = "---\nphase: 01\nstatus: draft\n---\nBody stays.\n";
        let patch = serde_json::json!({"status": "done", "duration": "5m"});
        let (updated, fields) = merge(doc, &patch).unwrap();
        assert_eq!(fields, vec!["duration".to_string(), "status".to_string()]);
        let (front, body) = split(&updated);
        let m = parse(front.unwrap()).mapping;
        assert_eq!(m.get("status").unwrap().as_str(), Some("done"));
        assert_eq!(m.get("duration").unwrap().as_str(), Some("5m"));
        assert_eq!(m.get("phase").unwrap().as_str(), Some("01"));
        assert_eq!(body, "Body stays.\n");
    }

    #[test]
    fn merge_creates_frontmatter_when_absent() {
        let (updated, _) = merge("Just a body\n", &serde_json::json!({"phase": "02"})).unwrap();
        let (front, body) = split(&updated);
        assert!(front.is_some());
        assert_eq!(body, "Just a body\n");
    }

    #[test]
    fn merge_rejects_non_object() {
        assert!(merge("x\n", &serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn set_field_coerces_types() {
        let updated = set_field("---\nphase: 01\n---\nbody", "autonomous", "true");
        let (front, _) = split(&updated);
        let m = parse(front.unwrap()).mapping;
        assert_eq!(m.get("autonomous").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn validate_plan_reports_missing() {
        let parsed = parse("phase: 01\nplan: 1\ntype: execute\n");
        let report = validate(&parsed.mapping, "plan").unwrap();
        assert!(!report.valid);
        assert!(report.missing.contains(&"wave".to_string()));
        assert!(report.missing.contains(&"must_haves".to_string()));
    }

    #[test]
    fn validate_summary_passes_with_required_fields() {
        let parsed = parse(
            "phase: 01\nplan: 1\nsubsystem: auth\ntags: [api]\nduration: 5m\ncompleted: 2024-01-15\n",
        );
        let report = validate(&parsed.mapping, "summary").unwrap();
        assert!(report.valid, "missing: {:?}", report.missing);
    }

    #[test]
    fn validate_unknown_schema_is_an_error() {
        let report = validate(&Mapping::new(), "nope");
        assert!(matches!(report, Err(GsdError::UnknownSchema(_))));
    }
}
