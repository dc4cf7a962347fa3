use crate::output::print_json;
use clap::Subcommand;
use gsd_core::digest;
use serde_json::json;
use std::path::Path;

#[derive(Subcommand)]
pub enum SummarySubcommand {
    /// Digest every phase's executed work into a compact history
    Digest,

    /// Pull key frontmatter fields out of one summary document
    Extract {
        path: String,

        /// Comma-separated field filter (one_liner, key_files, tech_added,
        /// patterns, decisions)
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
    },
}

pub fn run(root: &Path, subcommand: SummarySubcommand) -> anyhow::Result<()> {
    match subcommand {
        SummarySubcommand::Digest => print_json(&digest::history_digest(root)?),
        SummarySubcommand::Extract { path, fields } => {
            match digest::summary_extract(root, &path, fields.as_deref())? {
                Some(extract) => print_json(&extract),
                None => print_json(&json!({ "error": "File not found" })),
            }
        }
    }
}
