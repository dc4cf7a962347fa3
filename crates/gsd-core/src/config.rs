//! `.planning/config.json` access and model-profile resolution.
//!
//! Config reads are lenient: a missing or corrupt file falls back to
//! defaults so read paths never block on bad JSON. Writes go through the
//! strict parser and fail loudly.

use crate::error::Result;
use crate::io;
use crate::jsonc;
use crate::paths;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::Path;

pub const DEFAULT_PROFILE: &str = "balanced";

pub fn defaults() -> Value {
    json!({
        "model_profile": DEFAULT_PROFILE,
        "commit_docs": true,
    })
}

/// Defaults overlaid with whatever the config file holds. Corrupt JSON is
/// logged and ignored.
pub fn load(root: &Path) -> Config {
    let path = paths::config_path(root);
    let mut merged = defaults();
    let mut exists = false;
    if let Ok(Some(text)) = io::read_optional(&path) {
        exists = true;
        match jsonc::parse(&text) {
            Ok(Value::Object(fields)) => {
                if let Value::Object(target) = &mut merged {
                    for (key, value) in fields {
                        target.insert(key, value);
                    }
                }
            }
            Ok(_) => tracing::debug!(path = %path.display(), "config is not an object, using defaults"),
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "unreadable config, using defaults"),
        }
    }
    Config {
        exists,
        values: merged,
    }
}

#[derive(Debug)]
pub struct Config {
    pub exists: bool,
    pub values: Value,
}

impl Config {
    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn bool_value(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    pub fn profile(&self) -> &str {
        self.str_value("model_profile").unwrap_or(DEFAULT_PROFILE)
    }
}

// ---------------------------------------------------------------------------
// Ensure / set
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct Ensured {
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

/// Write the default config if none exists yet.
pub fn ensure(root: &Path) -> Result<Ensured> {
    let path = paths::config_path(root);
    if path.exists() {
        return Ok(Ensured {
            created: false,
            reason: Some("already_exists"),
        });
    }
    io::atomic_write(&path, format!("{:#}\n", defaults()))?;
    Ok(Ensured {
        created: true,
        reason: None,
    })
}

#[derive(Debug, Serialize)]
pub struct ConfigSet {
    pub updated: bool,
    pub key: String,
    pub value: Value,
}

/// Assign a dot-path key, creating intermediate objects and the file itself
/// as needed. Values are coerced: booleans and numbers before strings.
pub fn set(root: &Path, key: &str, raw_value: &str) -> Result<ConfigSet> {
    let path = paths::config_path(root);
    let mut doc = match io::read_optional(&path)? {
        Some(text) => jsonc::parse(&text)?,
        None => json!({}),
    };
    if !doc.is_object() {
        doc = json!({});
    }
    let value = coerce(raw_value);

    let mut cursor = &mut doc;
    let segments: Vec<&str> = key.split('.').collect();
    for segment in &segments[..segments.len() - 1] {
        let obj = cursor
            .as_object_mut()
            .ok_or_else(|| crate::error::GsdError::InvalidInput(format!(
                "config key {key} crosses a non-object value"
            )))?;
        cursor = obj
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !cursor.is_object() {
            *cursor = Value::Object(Map::new());
        }
    }
    if let Some(last) = segments.last() {
        if let Some(obj) = cursor.as_object_mut() {
            obj.insert(last.to_string(), value.clone());
        }
    }

    io::atomic_write(&path, format!("{doc:#}\n"))?;
    Ok(ConfigSet {
        updated: true,
        key: key.to_string(),
        value,
    })
}

fn coerce(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = raw.parse::<i64>() {
                json!(n)
            } else if let Ok(f) = raw.parse::<f64>() {
                json!(f)
            } else {
                Value::String(raw.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Model resolution
// ---------------------------------------------------------------------------

// Columns: quality, balanced, budget.
const MODEL_TABLE: &[(&str, [&str; 3])] = &[
    ("researcher", ["opus", "opus", "sonnet"]),
    ("synthesizer", ["opus", "opus", "sonnet"]),
    ("roadmapper", ["opus", "sonnet", "sonnet"]),
    ("planner", ["opus", "opus", "sonnet"]),
    ("executor", ["opus", "sonnet", "sonnet"]),
    ("verifier", ["opus", "sonnet", "haiku"]),
    ("checker", ["sonnet", "sonnet", "haiku"]),
    ("mapper", ["sonnet", "sonnet", "haiku"]),
    ("debugger", ["opus", "sonnet", "sonnet"]),
];

#[derive(Debug, Serialize)]
pub struct ResolvedModel {
    pub model: &'static str,
    pub profile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown_agent: Option<bool>,
}

/// Look up the model for an agent under the configured profile. Unknown
/// agents resolve to sonnet and are flagged, never rejected.
pub fn resolve_model(root: &Path, agent: &str) -> ResolvedModel {
    let profile = load(root).profile().to_string();
    let column = match profile.as_str() {
        "quality" => 0,
        "budget" => 2,
        _ => 1,
    };
    let role = agent.strip_prefix("gsd-").unwrap_or(agent);
    match MODEL_TABLE.iter().find(|(name, _)| *name == role) {
        Some((_, models)) => ResolvedModel {
            model: models[column],
            profile,
            unknown_agent: None,
        },
        None => ResolvedModel {
            model: "sonnet",
            profile,
            unknown_agent: Some(true),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
