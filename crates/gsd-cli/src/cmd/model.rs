use crate::output::print_json;
use gsd_core::config;
use std::path::Path;

pub fn run(root: &Path, agent: &str) -> anyhow::Result<()> {
    print_json(&config::resolve_model(root, agent))
}
