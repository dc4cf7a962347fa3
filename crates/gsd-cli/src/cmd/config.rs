use crate::output::print_json;
use clap::Subcommand;
use gsd_core::config;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Create config.json with defaults when absent
    Ensure,

    /// Set one key, parsing the value as JSON when it is
    Set { key: String, value: String },
}

pub fn run(root: &Path, subcommand: ConfigSubcommand) -> anyhow::Result<()> {
    match subcommand {
        ConfigSubcommand::Ensure => print_json(&config::ensure(root)?),
        ConfigSubcommand::Set { key, value } => print_json(&config::set(root, &key, &value)?),
    }
}
