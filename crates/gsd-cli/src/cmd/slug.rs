use crate::output::print_json;
use gsd_core::error::GsdError;
use gsd_core::paths;
use serde_json::json;

pub fn run(text: &[String]) -> anyhow::Result<()> {
    let joined = text.join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        return Err(GsdError::InvalidInput("text required".to_string()).into());
    }
    print_json(&json!({ "slug": paths::slugify(trimmed) }))
}
