use crate::output::print_json;
use clap::Subcommand;
use gsd_core::todo;
use std::path::Path;

#[derive(Subcommand)]
pub enum TodoSubcommand {
    /// List pending todos with their first-line summaries
    List {
        /// Filter by the Area frontmatter field
        #[arg(long)]
        area: Option<String>,
    },

    /// Move a pending todo into the completed directory
    Complete { file: String },
}

pub fn run(root: &Path, subcommand: TodoSubcommand) -> anyhow::Result<()> {
    match subcommand {
        TodoSubcommand::List { area } => print_json(&todo::list(root, area.as_deref())?),
        TodoSubcommand::Complete { file } => print_json(&todo::complete(root, &file)?),
    }
}
