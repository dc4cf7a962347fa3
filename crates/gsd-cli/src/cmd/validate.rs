use crate::output::print_json;
use gsd_core::roadmap;
use serde_json::json;
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    match roadmap::validate_consistency(root)? {
        Some(report) => print_json(&report),
        None => print_json(&json!({ "error": "ROADMAP.md not found" })),
    }
}
