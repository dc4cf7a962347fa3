use crate::output::print_json;
use serde_json::json;
use std::path::Path;

pub fn run(root: &Path, rel_path: &str) -> anyhow::Result<()> {
    let path = root.join(rel_path);
    let kind = if path.is_dir() {
        Some("directory")
    } else if path.is_file() {
        Some("file")
    } else {
        None
    };
    print_json(&json!({
        "exists": kind.is_some(),
        "type": kind,
    }))
}
