//! Frontmatter dialect converters.
//!
//! Claude agent/command definitions are the source of truth; these rewrite
//! a whole document into the OpenCode or Gemini dialect. All converters are
//! total functions over the document text: malformed frontmatter degrades to
//! a body-only rewrite instead of failing the install.

use crate::frontmatter::{self, ListStyle, Mapping, Value};
use crate::toolmap::{claude_tool_names, convert_gemini_tool_name, convert_tool_name, MCP_PREFIX};
use regex::Regex;
use std::sync::OnceLock;

/// Default configuration roots substituted for `~/.claude` in body prose.
pub const OPENCODE_CONFIG_ROOT: &str = "~/.config/opencode";
pub const GEMINI_CONFIG_ROOT: &str = "~/.gemini";

/// Named agent colors -> hex, for runtimes that want `#RRGGBB` values.
/// Unknown names pass through unchanged.
const COLOR_HEX: &[(&str, &str)] = &[
    ("red", "#EF4444"),
    ("orange", "#F97316"),
    ("yellow", "#EAB308"),
    ("green", "#10B981"),
    ("blue", "#3B82F6"),
    ("purple", "#8B5CF6"),
    ("pink", "#EC4899"),
    ("cyan", "#06B6D4"),
];

#[derive(Clone, Copy)]
enum Target {
    Opencode,
    Gemini,
}

static TOOL_WORD_RE: OnceLock<Regex> = OnceLock::new();

fn tool_word_re() -> &'static Regex {
    TOOL_WORD_RE.get_or_init(|| {
        let names: Vec<&str> = claude_tool_names().collect();
        Regex::new(&format!(r"\b({})\b", names.join("|"))).unwrap()
    })
}

static SUB_TAG_RE: OnceLock<Regex> = OnceLock::new();

fn sub_tag_re() -> &'static Regex {
    SUB_TAG_RE.get_or_init(|| Regex::new(r"(?s)<sub>(.*?)</sub>").unwrap())
}

/// Replace every `<sub>CONTENT</sub>` span with `*(CONTENT)*`.
pub fn strip_sub_tags(text: &str) -> String {
    sub_tag_re().replace_all(text, "*($1)*").into_owned()
}

/// The three rewrites shared by every converter: the Claude config root, the
/// command namespace separator, and bare tool names in prose.
fn rewrite_body(body: &str, config_root: &str, target: Target) -> String {
    let text = body.replace("~/.claude", config_root);
    let text = text.replace("/gsd:", "/gsd-");
    tool_word_re()
        .replace_all(&text, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match target {
                Target::Opencode => convert_tool_name(name),
                // An excluded name stays as written; dropping prose words
                // would corrupt sentences.
                Target::Gemini => {
                    convert_gemini_tool_name(name).unwrap_or_else(|| name.to_string())
                }
            }
        })
        .into_owned()
}

/// Union of `allowed-tools` and the inline `tools` field, in document order.
/// Both list and comma-separated string forms are accepted.
fn tool_union(mapping: &Mapping) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for key in ["allowed-tools", "tools"] {
        let Some(value) = mapping.get(key) else {
            continue;
        };
        let found: Vec<String> = match value {
            Value::List(items) => items.clone(),
            Value::Str(s) => s
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        for name in found {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

// ---------------------------------------------------------------------------
// OpenCode agents
// ---------------------------------------------------------------------------

/// Convert a Claude agent definition to the OpenCode dialect: no `name`
/// field, hex colors, and a `tools:` map of booleans with MCP names kept
/// verbatim.
pub fn to_opencode_agent(document: &str, config_root: &str) -> String {
    let (front, body) = frontmatter::split(document);
    let body_out = rewrite_body(body, config_root, Target::Opencode);
    let Some(front) = front else {
        return body_out;
    };
    let mut mapping = frontmatter::parse(front).mapping;
    mapping.remove("name");
    if let Some(hex) = mapping
        .get("color")
        .and_then(Value::as_str)
        .and_then(|color| {
            let lower = color.to_lowercase();
            COLOR_HEX
                .iter()
                .find(|(name, _)| *name == lower)
                .map(|(_, hex)| hex.to_string())
        })
    {
        mapping.set("color", Value::Str(hex));
    }

    let tools = tool_union(&mapping);
    mapping.remove("allowed-tools");
    mapping.remove("tools");
    if !tools.is_empty() {
        let mut entries: Vec<(String, Value)> = Vec::new();
        for name in tools {
            let converted = if name.starts_with(MCP_PREFIX) {
                name
            } else {
                convert_tool_name(&name)
            };
            if !entries.iter().any(|(k, _)| *k == converted) {
                entries.push((converted, Value::Bool(true)));
            }
        }
        mapping.set("tools", Value::Map(entries));
    }
    frontmatter::compose(&mapping, &body_out, ListStyle::Inline)
}

// ---------------------------------------------------------------------------
// Gemini agents
// ---------------------------------------------------------------------------

/// Convert a Claude agent definition to the Gemini dialect: no `color`, a
/// `tools:` YAML list with excluded tools omitted (and the key omitted when
/// nothing survives), and `<sub>` spans flattened for a renderer that lacks
/// them.
pub fn to_gemini_agent(document: &str, config_root: &str) -> String {
    let (front, body) = frontmatter::split(document);
    let body_out = strip_sub_tags(&rewrite_body(body, config_root, Target::Gemini));
    let Some(front) = front else {
        return body_out;
    };
    let mut mapping = frontmatter::parse(front).mapping;
    mapping.remove("color");

    let mut tools: Vec<String> = Vec::new();
    for name in tool_union(&mapping) {
        if let Some(converted) = convert_gemini_tool_name(&name) {
            if !tools.contains(&converted) {
                tools.push(converted);
            }
        }
    }
    mapping.remove("allowed-tools");
    mapping.remove("tools");
    if !tools.is_empty() {
        mapping.set("tools", Value::List(tools));
    }
    frontmatter::compose(&mapping, &body_out, ListStyle::Block)
}

// ---------------------------------------------------------------------------
// Gemini commands (TOML)
// ---------------------------------------------------------------------------

/// Convert a Claude command definition to Gemini's TOML command format.
/// Everything except `description` is dropped; the body becomes the prompt.
/// JSON string escaping is valid TOML for these values and preserves
/// newlines as `\n`.
pub fn to_gemini_command(document: &str, config_root: &str) -> String {
    let (front, body) = frontmatter::split(document);
    let body_out = rewrite_body(body, config_root, Target::Gemini);
    let description = front.and_then(|f| {
        frontmatter::parse(f)
            .mapping
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    let mut out = String::new();
    if let Some(desc) = description {
        out.push_str(&format!("description = {}\n", json_quote(&desc)));
    }
    out.push_str(&format!("prompt = {}\n", json_quote(&body_out)));
    out
}

fn json_quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
